//! Ability ECS systems
//!
//! Порядок в FixedUpdate (chained):
//! suspend_abilities → tick_abilities → (integrate_bodies) → ... → apply_fall_damage

use bevy::ecs::query::QueryData;
use bevy::prelude::*;

use super::{AbilityChanged, AbilityContext, AbilityCoordinator, FallDamageTaken, LandingImpact, Landed};
use crate::animation::ClipAnimator;
use crate::body::{BodyHandle, KinematicBody};
use crate::components::{AbilitiesSuspended, AbilityInput, FallDamage, Health, ViewOrientation, VoiceEmitter, VoicePlayer};
use crate::geometry::{GeometryProvider, GeometryQuery};
use crate::logger;

/// Всё, что нужно coordinator'у одного персонажа на tick
#[derive(QueryData)]
#[query_data(mutable)]
pub struct CharacterAbilities {
    entity: Entity,
    coordinator: &'static mut AbilityCoordinator,
    body: &'static mut KinematicBody,
    transform: &'static mut Transform,
    animator: &'static mut ClipAnimator,
    input: &'static AbilityInput,
    view: &'static ViewOrientation,
    voice: Option<&'static mut VoiceEmitter>,
}

/// Собирает `AbilityContext` из компонентов персонажа и прогоняет `run`
fn with_context<R>(
    character: &mut CharacterAbilitiesItem,
    geometry: &dyn GeometryQuery,
    delta: f32,
    run: impl FnOnce(&mut AbilityCoordinator, &mut AbilityContext) -> R,
) -> (R, Vec<LandingImpact>) {
    let mut handle = BodyHandle::new(
        &mut *character.body,
        &mut *character.transform,
        character.view.yaw_degrees,
        delta,
    );
    let mut landings = Vec::new();

    let mut ctx = AbilityContext {
        body: &mut handle,
        animator: &mut *character.animator,
        geometry,
        input: character.input,
        view: character.view,
        voice: character
            .voice
            .as_deref_mut()
            .map(|voice| voice as &mut dyn VoicePlayer),
        landings: &mut landings,
        delta,
    };

    let result = run(&mut *character.coordinator, &mut ctx);
    (result, landings)
}

fn write_landings(entity: Entity, landings: Vec<LandingImpact>, landed_events: &mut EventWriter<Landed>) {
    for impact in landings {
        logger::log_info(&format!("Entity {:?} landed: {:?}", entity, impact));
        landed_events.write(Landed { entity, impact });
    }
}

/// Система: один tick coordinator'а на персонажа
///
/// Без GeometryProvider tick пропускается (ошибка setup'а, не per-tick логики).
pub fn tick_abilities(
    mut characters: Query<CharacterAbilities, Without<AbilitiesSuspended>>,
    geometry: Option<Res<GeometryProvider>>,
    time: Res<Time<Fixed>>,
    mut landed_events: EventWriter<Landed>,
    mut changed_events: EventWriter<AbilityChanged>,
) {
    let Some(geometry) = geometry else {
        logger::log_error("tick_abilities: GeometryProvider missing, tick skipped");
        return;
    };
    let delta = time.delta_secs();

    for mut character in characters.iter_mut() {
        let entity = character.entity;
        let (transition, landings) = with_context(&mut character, geometry.query(), delta, |coordinator, ctx| {
            coordinator.tick(ctx)
        });

        if let Some(transition) = transition {
            changed_events.write(AbilityChanged {
                entity,
                from: transition.from,
                to: transition.to,
            });
        }

        write_landings(entity, landings, &mut landed_events);
    }
}

/// Система: teardown coordinator'а при добавлении `AbilitiesSuspended`
///
/// Активная ability получает on_stop (collision/gravity восстанавливаются),
/// slot уходит в Idle. После снятия маркера coordinator стартует заново.
pub fn suspend_abilities(
    mut characters: Query<CharacterAbilities, Added<AbilitiesSuspended>>,
    geometry: Option<Res<GeometryProvider>>,
    time: Res<Time<Fixed>>,
    mut landed_events: EventWriter<Landed>,
) {
    let Some(geometry) = geometry else {
        return;
    };
    let delta = time.delta_secs();

    for mut character in characters.iter_mut() {
        let entity = character.entity;
        let (stopped, landings) = with_context(&mut character, geometry.query(), delta, |coordinator, ctx| {
            coordinator.teardown(ctx)
        });

        if let Some(kind) = stopped {
            logger::log_info(&format!("Entity {:?}: abilities suspended ({} stopped)", entity, kind.as_str()));
        }

        write_landings(entity, landings, &mut landed_events);
    }
}

/// Система: урон от hard landing (opt-in через FallDamage)
pub fn apply_fall_damage(
    mut landed_events: EventReader<Landed>,
    mut victims: Query<(&FallDamage, &mut Health)>,
    mut damage_events: EventWriter<FallDamageTaken>,
) {
    for event in landed_events.read() {
        let LandingImpact::Hard {
            fall_distance,
            damage_ratio,
        } = event.impact
        else {
            continue;
        };

        let Ok((fall_damage, mut health)) = victims.get_mut(event.entity) else {
            continue;
        };

        let damage = fall_damage.damage_for(damage_ratio);
        if damage == 0 {
            continue;
        }

        health.take_damage(damage);
        logger::log_info(&format!(
            "Entity {:?} fall damage: {} (fall {:.2}m, HP {}/{})",
            event.entity, damage, fall_distance, health.current, health.max
        ));

        damage_events.write(FallDamageTaken {
            entity: event.entity,
            damage,
            fall_distance,
            remaining: health.current,
        });
    }
}
