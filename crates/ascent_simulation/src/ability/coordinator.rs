//! AbilityCoordinator - единственный активный slot abilities
//!
//! Протокол tick'а:
//! - Idle → выбрать первый готовый candidate (или default) и стартовать
//! - Candidate(i) → update; на Stop: on_stop, выбор, on_start следующей
//! - Default → сначала candidates (locomotion вытесняема), иначе update locomotion
//!
//! Ability, стартовавшая в tick'е, получает первый update на следующем tick'е.
//! on_stop старой ability всегда завершается до on_start новой.

use bevy::prelude::*;

use super::{
    Ability, AbilityContext, AbilityFlow, AbilityKind, AbilityState, AbilityTransition, ClimbUp, JumpAndFalling,
    Locomotion,
};
use crate::config::{AbilitySetConfig, SetupError};
use crate::logger;

/// Активный slot coordinator'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ActiveSlot {
    /// Ничего не активно (до первого tick'а или после teardown)
    #[default]
    Idle,
    /// Default state (locomotion)
    Default,
    /// Candidate по индексу в priority списке
    Candidate(usize),
}

/// Component: ability state machine персонажа
#[derive(Component, Debug, Clone)]
pub struct AbilityCoordinator {
    candidates: Vec<AbilityState>,
    default_state: AbilityState,
    slot: ActiveSlot,
}

impl AbilityCoordinator {
    /// Строит coordinator из конфигурации (порядок candidates = `priority`)
    pub fn configure(config: &AbilitySetConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let candidates = config
            .priority
            .iter()
            .map(|kind| match kind {
                AbilityKind::ClimbUp => Ok(AbilityState::ClimbUp(ClimbUp::new(config.climb_up.clone()))),
                AbilityKind::JumpAndFalling => Ok(AbilityState::JumpAndFalling(JumpAndFalling::new(
                    config.jump_and_falling.clone(),
                ))),
                AbilityKind::Locomotion => Err(SetupError::InvalidPriority(
                    "Locomotion is the default state and cannot be a candidate".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            candidates,
            default_state: AbilityState::Locomotion(Locomotion::new(config.locomotion.clone())),
            slot: ActiveSlot::Idle,
        })
    }

    pub fn slot(&self) -> ActiveSlot {
        self.slot
    }

    /// Kind активной ability (None - Idle)
    pub fn active_kind(&self) -> Option<AbilityKind> {
        self.active().map(|state| state.kind())
    }

    pub fn active(&self) -> Option<&AbilityState> {
        match self.slot {
            ActiveSlot::Idle => None,
            ActiveSlot::Default => Some(&self.default_state),
            ActiveSlot::Candidate(index) => self.candidates.get(index),
        }
    }

    fn active_mut(&mut self) -> Option<&mut AbilityState> {
        match self.slot {
            ActiveSlot::Idle => None,
            ActiveSlot::Default => Some(&mut self.default_state),
            ActiveSlot::Candidate(index) => self.candidates.get_mut(index),
        }
    }

    /// Порядок candidates (сверху вниз)
    pub fn priority(&self) -> Vec<AbilityKind> {
        self.candidates.iter().map(|state| state.kind()).collect()
    }

    /// Один tick state machine
    ///
    /// Возвращает transition, если активная ability сменилась
    /// (в т.ч. рестарт той же ability после её stop).
    pub fn tick(&mut self, ctx: &mut AbilityContext) -> Option<AbilityTransition> {
        let from = self.active_kind();

        let switched = match self.slot {
            ActiveSlot::Idle => {
                self.start_next(ctx);
                true
            }
            ActiveSlot::Default => match self.first_ready(ctx) {
                Some(index) => {
                    self.stop_active(ctx);
                    self.start(ActiveSlot::Candidate(index), ctx);
                    true
                }
                None => self.update_active(ctx),
            },
            ActiveSlot::Candidate(_) => self.update_active(ctx),
        };

        if !switched {
            return None;
        }

        let to = self.active_kind()?;
        logger::log(&format!(
            "AbilityCoordinator: {} → {}",
            from.map_or("Idle", |kind| kind.as_str()),
            to.as_str()
        ));

        Some(AbilityTransition { from, to })
    }

    /// Останавливает активную ability, slot → Idle
    pub fn teardown(&mut self, ctx: &mut AbilityContext) -> Option<AbilityKind> {
        let stopped = self.active_kind();
        self.stop_active(ctx);
        stopped
    }

    /// Update активной ability; true - ability остановилась и slot сменился
    fn update_active(&mut self, ctx: &mut AbilityContext) -> bool {
        let flow = match self.active_mut() {
            Some(state) => state.update(ctx),
            None => return false,
        };

        if flow == AbilityFlow::Continue {
            return false;
        }

        self.stop_active(ctx);
        self.start_next(ctx);
        true
    }

    /// Первый готовый candidate сверху вниз
    fn first_ready(&mut self, ctx: &mut AbilityContext) -> Option<usize> {
        self.candidates.iter_mut().position(|state| state.ready_to_start(ctx))
    }

    fn start_next(&mut self, ctx: &mut AbilityContext) {
        let next = match self.first_ready(ctx) {
            Some(index) => ActiveSlot::Candidate(index),
            None => ActiveSlot::Default,
        };
        self.start(next, ctx);
    }

    fn start(&mut self, slot: ActiveSlot, ctx: &mut AbilityContext) {
        self.slot = slot;
        if let Some(state) = self.active_mut() {
            state.on_start(ctx);
        }
    }

    fn stop_active(&mut self, ctx: &mut AbilityContext) {
        if let Some(state) = self.active_mut() {
            state.on_stop(ctx);
        }
        self.slot = ActiveSlot::Idle;
    }
}
