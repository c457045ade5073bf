//! Конфигурация abilities
//!
//! Числовые параметры, имена анимационных состояний и voice cue'и.
//! Задаются один раз при setup (JSON или `Default`), дальше immutable.
//! Все проверки - здесь, per-tick код ошибок не возвращает.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ability::AbilityKind;
use crate::geometry::{CollisionMask, LAYER_CLIMBABLE};

/// Ошибки setup'а (конфигурация, collaborators)
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("invalid priority list: {0}")]
    InvalidPriority(String),
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error("malformed config: {0}")]
    MalformedConfig(#[from] serde_json::Error),
}

fn invalid(name: &'static str, reason: impl Into<String>) -> SetupError {
    SetupError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be > 0, got {}", value)))
    }
}

fn require_non_negative(name: &'static str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be >= 0, got {}", value)))
    }
}

fn require_state_name(name: &'static str, value: &str) -> Result<(), SetupError> {
    if value.trim().is_empty() {
        Err(invalid(name, "animation state name is empty"))
    } else {
        Ok(())
    }
}

fn require_fraction(name: &'static str, value: f32) -> Result<(), SetupError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, format!("must be within [0, 1], got {}", value)))
    }
}

// ============================================================================
// ClimbUp
// ============================================================================

/// Параметры короткого подъёма на уступ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbUpConfig {
    /// Bits слоёв climbable геометрии (rapier `Group`)
    pub climb_mask: u32,
    pub overlap_radius: f32,
    pub capsule_cast_radius: f32,
    pub capsule_cast_height: f32,
    pub min_climb_height: f32,
    pub max_climb_height: f32,
    pub climb_state: String,
    pub blend_time: f32,
    /// Окно pose correction (normalized time climb clip'а)
    pub match_start: f32,
    pub match_end: f32,
    /// Normalized time, после которого climb завершён
    pub exit_time: f32,
}

impl Default for ClimbUpConfig {
    fn default() -> Self {
        Self {
            climb_mask: LAYER_CLIMBABLE.bits(),
            overlap_radius: 0.75,
            capsule_cast_radius: 0.2,
            capsule_cast_height: 1.0,
            min_climb_height: 0.5,
            max_climb_height: 1.5,
            climb_state: "Climb Up".to_string(),
            blend_time: 0.1,
            match_start: 0.15,
            match_end: 0.42,
            exit_time: 0.95,
        }
    }
}

impl ClimbUpConfig {
    pub fn mask(&self) -> CollisionMask {
        CollisionMask::from_bits_truncate(self.climb_mask)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.mask().is_empty() {
            return Err(invalid("climb_up.climb_mask", "no collision layers selected"));
        }
        require_positive("climb_up.overlap_radius", self.overlap_radius)?;
        require_positive("climb_up.capsule_cast_radius", self.capsule_cast_radius)?;
        require_non_negative("climb_up.min_climb_height", self.min_climb_height)?;
        require_non_negative("climb_up.blend_time", self.blend_time)?;

        if self.max_climb_height <= self.min_climb_height {
            return Err(invalid(
                "climb_up.max_climb_height",
                format!("must exceed min_climb_height ({})", self.min_climb_height),
            ));
        }
        if self.capsule_cast_height - self.capsule_cast_radius < self.min_climb_height + self.capsule_cast_radius {
            return Err(invalid(
                "climb_up.capsule_cast_height",
                "capsule cast segment is inverted (height too small for min_climb_height + radius)",
            ));
        }

        require_fraction("climb_up.match_start", self.match_start)?;
        require_fraction("climb_up.match_end", self.match_end)?;
        if self.match_start >= self.match_end {
            return Err(invalid("climb_up.match_end", "pose correction window is empty"));
        }
        require_fraction("climb_up.exit_time", self.exit_time)?;
        require_state_name("climb_up.climb_state", &self.climb_state)
    }
}

// ============================================================================
// JumpAndFalling
// ============================================================================

/// Параметры прыжка, полёта и приземления
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpAndFallingConfig {
    pub jump_state: String,
    pub fall_state: String,
    pub hard_land_state: String,
    pub jump_height: f32,
    pub speed_on_air: f32,
    /// Smooth time для input и поворота в воздухе
    pub air_control: f32,
    pub height_for_hard_land: f32,
    pub height_for_kill_on_land: f32,
    pub jump_blend: f32,
    pub fall_blend: f32,
    pub hard_land_blend: f32,
    /// Скорость схода с края, выше которой берём `speed_on_air`
    pub carried_speed_threshold: f32,
    /// |v.y| при приземлении, начиная с которого soft landing уведомляет
    pub landed_speed_threshold: f32,
    pub exit_time: f32,
    pub jump_voice: Option<String>,
    pub hard_land_voice: Option<String>,
}

impl Default for JumpAndFallingConfig {
    fn default() -> Self {
        Self {
            jump_state: "Air.Jump".to_string(),
            fall_state: "Air.Falling".to_string(),
            hard_land_state: "Air.HardLand".to_string(),
            jump_height: 1.2,
            speed_on_air: 6.0,
            air_control: 0.5,
            height_for_hard_land: 3.0,
            height_for_kill_on_land: 7.0,
            jump_blend: 0.1,
            fall_blend: 0.25,
            hard_land_blend: 0.02,
            carried_speed_threshold: 3.5,
            landed_speed_threshold: 3.0,
            exit_time: 0.95,
            jump_voice: Some("voice.jump".to_string()),
            hard_land_voice: Some("voice.hard_land".to_string()),
        }
    }
}

impl JumpAndFallingConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_positive("jump_and_falling.jump_height", self.jump_height)?;
        require_non_negative("jump_and_falling.speed_on_air", self.speed_on_air)?;
        require_positive("jump_and_falling.air_control", self.air_control)?;
        require_non_negative("jump_and_falling.height_for_hard_land", self.height_for_hard_land)?;
        require_non_negative("jump_and_falling.jump_blend", self.jump_blend)?;
        require_non_negative("jump_and_falling.fall_blend", self.fall_blend)?;
        require_non_negative("jump_and_falling.hard_land_blend", self.hard_land_blend)?;
        require_non_negative("jump_and_falling.carried_speed_threshold", self.carried_speed_threshold)?;
        require_non_negative("jump_and_falling.landed_speed_threshold", self.landed_speed_threshold)?;
        require_fraction("jump_and_falling.exit_time", self.exit_time)?;

        // Знаменатель damage ratio
        if self.height_for_kill_on_land <= self.height_for_hard_land {
            return Err(invalid(
                "jump_and_falling.height_for_kill_on_land",
                format!("must exceed height_for_hard_land ({})", self.height_for_hard_land),
            ));
        }

        require_state_name("jump_and_falling.jump_state", &self.jump_state)?;
        require_state_name("jump_and_falling.fall_state", &self.fall_state)?;
        require_state_name("jump_and_falling.hard_land_state", &self.hard_land_state)
    }

    /// Доля урона от падения: 0 на пороге hard land, 1 на пороге kill
    pub fn damage_ratio(&self, fall_distance: f32) -> f32 {
        (fall_distance - self.height_for_hard_land) / (self.height_for_kill_on_land - self.height_for_hard_land)
    }
}

// ============================================================================
// Locomotion
// ============================================================================

/// Параметры наземного движения (default state)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub locomotion_state: String,
    pub blend_time: f32,
    pub walk_speed: f32,
    pub sprint_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            locomotion_state: "Locomotion".to_string(),
            blend_time: 0.25,
            walk_speed: 2.0,
            sprint_speed: 5.5,
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        require_non_negative("locomotion.walk_speed", self.walk_speed)?;
        require_non_negative("locomotion.sprint_speed", self.sprint_speed)?;
        require_non_negative("locomotion.blend_time", self.blend_time)?;
        require_state_name("locomotion.locomotion_state", &self.locomotion_state)
    }
}

// ============================================================================
// Ability set
// ============================================================================

/// Полный набор abilities персонажа
///
/// `priority` - порядок candidate'ов (сверху вниз), locomotion всегда default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilitySetConfig {
    pub priority: Vec<AbilityKind>,
    pub climb_up: ClimbUpConfig,
    pub jump_and_falling: JumpAndFallingConfig,
    pub locomotion: LocomotionConfig,
}

impl Default for AbilitySetConfig {
    fn default() -> Self {
        Self {
            priority: vec![AbilityKind::ClimbUp, AbilityKind::JumpAndFalling],
            climb_up: ClimbUpConfig::default(),
            jump_and_falling: JumpAndFallingConfig::default(),
            locomotion: LocomotionConfig::default(),
        }
    }
}

impl AbilitySetConfig {
    /// Парсит и валидирует JSON (отсутствующие поля берутся из `Default`)
    pub fn from_json_str(json: &str) -> Result<Self, SetupError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        for (index, kind) in self.priority.iter().enumerate() {
            if *kind == AbilityKind::Locomotion {
                return Err(SetupError::InvalidPriority(
                    "Locomotion is the default state and cannot be a candidate".to_string(),
                ));
            }
            if self.priority[..index].contains(kind) {
                return Err(SetupError::InvalidPriority(format!("{:?} listed twice", kind)));
            }
        }

        if self.priority.contains(&AbilityKind::ClimbUp) {
            self.climb_up.validate()?;
        }
        if self.priority.contains(&AbilityKind::JumpAndFalling) {
            self.jump_and_falling.validate()?;
        }
        self.locomotion.validate()
    }

    /// Имена всех анимационных состояний, которые могут запросить abilities
    pub fn animation_states(&self) -> Vec<&str> {
        let mut states = vec![self.locomotion.locomotion_state.as_str()];

        if self.priority.contains(&AbilityKind::ClimbUp) {
            states.push(self.climb_up.climb_state.as_str());
        }
        if self.priority.contains(&AbilityKind::JumpAndFalling) {
            let jump = &self.jump_and_falling;
            states.extend([
                jump.jump_state.as_str(),
                jump.fall_state.as_str(),
                jump.hard_land_state.as_str(),
            ]);
        }

        states
    }
}
