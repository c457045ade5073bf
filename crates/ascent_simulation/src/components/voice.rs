//! Voice collaborator (опциональный)
//!
//! Abilities проигрывают cue только если collaborator есть.
//! `VoiceEmitter` копит cue'и за tick, `flush_voice_requests` превращает их в events.

use bevy::prelude::*;

use crate::ability::events::VoicePlayed;

/// Проигрывание voice cue (реализуется audio слоем)
pub trait VoicePlayer {
    fn play_voice(&mut self, cue: &str);
}

/// Component: очередь voice cue'ев персонажа
#[derive(Component, Debug, Clone, Default)]
pub struct VoiceEmitter {
    pending: Vec<String>,
}

impl VoiceEmitter {
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, String> {
        self.pending.drain(..)
    }
}

impl VoicePlayer for VoiceEmitter {
    fn play_voice(&mut self, cue: &str) {
        self.pending.push(cue.to_string());
    }
}

/// Система: VoiceEmitter → VoicePlayed events
pub fn flush_voice_requests(mut emitters: Query<(Entity, &mut VoiceEmitter)>, mut played: EventWriter<VoicePlayed>) {
    for (entity, mut emitter) in emitters.iter_mut() {
        if emitter.pending.is_empty() {
            continue;
        }

        for cue in emitter.drain() {
            played.write(VoicePlayed { entity, cue });
        }
    }
}
