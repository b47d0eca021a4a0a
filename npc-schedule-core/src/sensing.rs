/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::cmp::Reverse;

use glam::Vec3;
use ordered_float::NotNan;

use crate::{
    listen, Agent, Conditions, Context, EnemyRef, EntityId, EntityInfo, MonsterBehavior,
    MonsterState, Relationship, SoundClass, SoundEvent, WaterLevel, WorldQuery,
};

/// Whether `viewer` has an unobstructed line of sight to `target`.
///
/// Sight does not cross a water surface: an entity with its eyes underwater neither sees
/// nor is seen by one with its eyes above.
pub fn is_visible(world: &dyn WorldQuery, viewer: &EntityInfo, target: &EntityInfo) -> bool {
    let viewer_submerged = viewer.water_level == WaterLevel::Eyes;
    let target_submerged = target.water_level == WaterLevel::Eyes;
    if viewer_submerged != target_submerged {
        return false;
    }
    let trace = world.trace_line(viewer.eye_position(), target.eye_position(), Some(viewer.id));
    trace.is_clear() || trace.hit_entity == Some(target.id)
}

fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.).normalize_or_zero()
}

/// Cosine between the horizontal facing of `viewer` and the horizontal direction to `point`.
pub fn facing_dot(viewer: &EntityInfo, point: Vec3) -> f32 {
    flat(viewer.forward).dot(flat(point - viewer.position))
}

/// Whether `point` lies within the horizontal field of view of `viewer`.
pub fn in_view_cone(viewer: &EntityInfo, point: Vec3, field_of_view: f32) -> bool {
    facing_dot(viewer, point) >= field_of_view
}

/// A visible entity the agent has feelings about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sighting {
    pub id: EntityId,
    pub relationship: Relationship,
    pub position: Vec3,
    pub distance: f32,
}

/// What an agent sees during one tick.
#[derive(Clone, Debug, Default)]
pub struct Look {
    /// `SEE_*` bits
    pub conditions: Conditions,
    /// visible hostiles
    pub hostiles: Vec<Sighting>,
}

impl Look {
    pub fn is_visible(&self, id: EntityId) -> bool {
        self.hostiles.iter().any(|sighting| sighting.id == id)
    }

    /// The most pressing hostile: highest relationship first, then the nearest.
    pub fn best(&self) -> Option<Sighting> {
        self.hostiles
            .iter()
            .filter_map(|sighting| {
                NotNan::new(sighting.distance)
                    .ok()
                    .map(|distance| ((Reverse(sighting.relationship), distance), sighting))
            })
            .min_by_key(|(key, _)| *key)
            .map(|(_, sighting)| *sighting)
    }
}

/// Scans the entities within the sensing radius of `me`.
///
/// Agents that are not yet aware of danger (idle ones) only see within their field of view.
pub fn look(
    agent: &Agent,
    me: &EntityInfo,
    behavior: &dyn MonsterBehavior,
    ctx: &Context,
) -> Look {
    let config = &ctx.config.sensing;
    let aware = agent.state != MonsterState::Idle;
    let mut look = Look::default();
    for id in ctx.world.entities_in_sphere(me.position, config.sensing_radius) {
        if id == agent.id {
            continue;
        }
        let Some(info) = ctx.world.entity(id) else {
            continue;
        };
        if !info.alive {
            continue;
        }
        let relationship = behavior.relationship(agent.classification, info.classification);
        let relevant =
            info.is_client || relationship.is_hostile() || relationship == Relationship::Fear;
        if !relevant {
            continue;
        }
        if !aware && !in_view_cone(me, info.eye_position(), config.field_of_view) {
            continue;
        }
        if !is_visible(ctx.world, me, &info) {
            continue;
        }
        if info.is_client {
            look.conditions |= Conditions::SEE_CLIENT;
        }
        look.conditions |= match relationship {
            Relationship::Nemesis => Conditions::SEE_NEMESIS,
            Relationship::Hate => Conditions::SEE_HATE,
            Relationship::Dislike => Conditions::SEE_DISLIKE,
            Relationship::Fear => Conditions::SEE_FEAR,
            _ => Conditions::empty(),
        };
        if relationship.is_hostile() {
            look.hostiles.push(Sighting {
                id,
                relationship,
                position: info.position,
                distance: me.position.distance(info.position),
            });
        }
    }
    look
}

/// Picks the hostile `agent` should fight among those it sees, if any.
pub fn select_best_visible_enemy(
    agent: &Agent,
    behavior: &dyn MonsterBehavior,
    ctx: &Context,
) -> Option<Sighting> {
    let me = ctx.body(agent)?;
    look(agent, &me, behavior, ctx).best()
}

/// Computes the conditions of `agent` for this tick from scratch, updating its enemy on the way.
///
/// The result is also stored in the agent.
pub fn evaluate_conditions(
    agent: &mut Agent,
    behavior: &dyn MonsterBehavior,
    ctx: &mut Context,
) -> Conditions {
    let mut conditions = Conditions::empty();
    let Some(me) = ctx.body(agent) else {
        agent.conditions = conditions;
        return conditions;
    };
    let time = ctx.time;
    let sensing = ctx.config.sensing.clone();

    // liveness of the current enemy
    if let Some(enemy) = agent.enemy {
        if !ctx.world.is_alive(enemy.handle) {
            log::debug!("{}: enemy {} is gone", agent.id, enemy.handle);
            conditions |= Conditions::ENEMY_DEAD | Conditions::LOST_ENEMY;
            if let Some(squad) = ctx.squad_mut() {
                squad.clear_enemy(enemy.handle);
            }
            agent.pop_enemy(ctx.world);
        }
    }

    let look = look(agent, &me, behavior, ctx);
    conditions |= look.conditions;

    // switch to a more pressing visible enemy
    if let Some(best) = look.best() {
        let switch = match &agent.enemy {
            None => true,
            Some(current) => {
                current.handle != best.id
                    && (best.relationship > current.relationship
                        || !look.is_visible(current.handle))
            }
        };
        if switch && agent.set_enemy(EnemyRef::new(best.id, best.position, best.relationship)) {
            conditions |= Conditions::NEW_ENEMY;
        }
    }

    // adopt the enemy of the squad
    if agent.enemy.is_none() {
        let shared = ctx
            .squad
            .as_deref()
            .filter(|squad| !squad.is_eluded())
            .and_then(|squad| squad.shared_enemy().copied());
        if let Some(shared) = shared {
            if ctx.world.is_alive(shared.handle) && agent.set_enemy(shared) {
                log::debug!("{}: adopts squad enemy {}", agent.id, shared.handle);
                conditions |= Conditions::NEW_ENEMY;
            }
        }
    }

    if let Some(enemy) = agent.enemy {
        let visible = look.is_visible(enemy.handle);
        let info = ctx.world.entity(enemy.handle);
        match (&info, visible) {
            (Some(info), true) => {
                conditions |= Conditions::SEE_ENEMY;
                agent.update_last_seen(info.position, time, sensing.rediscovery_threshold);
                if let (Some(squad), Some(enemy)) = (ctx.squad.as_deref_mut(), agent.enemy) {
                    squad.report_sighting(enemy, time);
                }
            }
            _ => {
                conditions |= Conditions::ENEMY_OCCLUDED;
                if let Some(squad) = ctx.squad.as_deref() {
                    // fresher news from a squad-mate
                    if let (Some(shared), Some(squad_seen)) =
                        (squad.shared_enemy(), squad.last_seen())
                    {
                        let fresher = agent.last_seen_enemy.map_or(true, |seen| squad_seen > seen);
                        if shared.handle == enemy.handle && fresher {
                            if let Some(current) = &mut agent.enemy {
                                current.last_known_position = shared.last_known_position;
                            }
                        }
                    }
                }
                if agent.should_forget_enemy(me.position, time, &sensing) {
                    log::debug!("{}: forgets enemy {}", agent.id, enemy.handle);
                    if let Some(squad) = ctx.squad_mut() {
                        squad.mark_eluded();
                    }
                    conditions |= Conditions::LOST_ENEMY;
                    agent.pop_enemy(ctx.world);
                }
            }
        }
    }

    // geometry of the enemy kept after all updates
    if let Some(enemy) = agent.enemy {
        if let Some(info) = ctx.world.entity(enemy.handle) {
            let distance = me.position.distance(info.position);
            if distance > sensing.too_far_distance {
                conditions |= Conditions::ENEMY_TOO_FAR;
            }
            if in_view_cone(&info, me.position, sensing.field_of_view) {
                conditions |= Conditions::ENEMY_FACING_ME;
            }
            if conditions.contains(Conditions::SEE_ENEMY) {
                let combat = &ctx.config.combat;
                let dot = facing_dot(&me, info.position);
                if behavior.check_melee_attack1(agent, dot, distance, combat) {
                    conditions |= Conditions::CAN_MELEE_ATTACK1;
                }
                if behavior.check_melee_attack2(agent, dot, distance, combat) {
                    conditions |= Conditions::CAN_MELEE_ATTACK2;
                }
                if behavior.check_range_attack1(agent, dot, distance, combat) {
                    conditions |= Conditions::CAN_RANGE_ATTACK1;
                }
                if behavior.check_range_attack2(agent, dot, distance, combat) {
                    conditions |= Conditions::CAN_RANGE_ATTACK2;
                }
            }
        }
    }

    if agent.clip.map_or(false, |clip| clip.is_empty()) {
        conditions |= Conditions::NO_AMMO_LOADED;
    }

    conditions |= agent.pending_damage;

    // hearing, own sounds excluded
    let sounds: Vec<SoundEvent> = ctx
        .sounds
        .iter()
        .filter(|sound| sound.emitter != Some(agent.id))
        .copied()
        .collect();
    let hearing = listen(
        me.eye_position(),
        sensing.hearing_sensitivity,
        behavior.hearing_mask(),
        &sounds,
        time,
    );
    if let Some(best) = hearing.best {
        agent.best_sound = Some(best);
    }
    conditions |= hearing.classes.conditions();
    let schedule_mask = agent
        .active
        .as_ref()
        .map(|active| active.schedule.sounds)
        .filter(|sounds| !sounds.is_empty())
        .unwrap_or(SoundClass::all());
    if hearing.classes.intersects(schedule_mask) {
        conditions |= Conditions::HEAR_SOUND;
    }

    if log::log_enabled!(log::Level::Trace) && !conditions.is_empty() {
        log::trace!("{}: {:?}", agent.id, conditions);
    }
    agent.conditions = conditions;
    conditions
}
