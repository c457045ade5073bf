//! ECS Components персонажа
//!
//! Организация по доменам:
//! - actor: маркер персонажа, здоровье, fall damage subscriber
//! - input: input abilities и ориентация камеры
//! - voice: опциональный voice collaborator (VoiceEmitter)

pub mod actor;
pub mod input;
pub mod voice;

// Re-exports для удобного импорта
pub use actor::*;
pub use input::*;
pub use voice::*;
