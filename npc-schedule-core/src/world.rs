/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{Classification, EntityId, HitGroup, SoundClass, SoundEvent};

/// How deep an entity is immersed in water.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterLevel {
    #[default]
    Dry,
    Feet,
    Waist,
    Eyes,
}

/// A read-only description of an entity, as seen through the world facade.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityInfo {
    pub id: EntityId,
    pub classification: Classification,
    /// origin of the entity, at its feet
    pub position: Vec3,
    /// offset from the origin to the eyes
    pub view_offset: Vec3,
    /// normalized facing direction
    pub forward: Vec3,
    pub health: f32,
    pub alive: bool,
    pub takes_damage: bool,
    pub is_client: bool,
    pub water_level: WaterLevel,
}
impl EntityInfo {
    pub fn eye_position(&self) -> Vec3 {
        self.position + self.view_offset
    }
    /// The point aimed at when targeting the body of this entity.
    pub fn body_target(&self) -> Vec3 {
        self.position + self.view_offset * 0.5
    }
}

/// The result of a ray or hull trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// fraction of the way travelled before hitting something, 1 if nothing was hit
    pub fraction: f32,
    pub end: Vec3,
    pub hit_entity: Option<EntityId>,
    pub hit_group: HitGroup,
    pub plane_normal: Vec3,
}
impl TraceResult {
    /// A trace that reached `end` without hitting anything.
    pub fn clear(end: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end,
            hit_entity: None,
            hit_group: HitGroup::Generic,
            plane_normal: Vec3::ZERO,
        }
    }
    pub fn is_clear(&self) -> bool {
        self.fraction >= 1.0
    }
}

/// An axis-aligned bounding volume swept along hull traces.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub half_extents: Vec3,
}
impl Hull {
    pub const POINT: Hull = Hull {
        half_extents: Vec3::ZERO,
    };
    pub const HUMAN: Hull = Hull {
        half_extents: Vec3::new(16., 16., 36.),
    };
    pub const MELEE: Hull = Hull {
        half_extents: Vec3::new(16., 16., 16.),
    };
}

/// Progress of the locomotion towards the last requested goal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Idle,
    Moving,
    Arrived,
    Failed,
}

/// The animation-level activity an entity is performing.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    #[default]
    Idle,
    CombatIdle,
    Walk,
    Run,
    Crouch,
    SmallFlinch,
    BigFlinch,
    RangeAttack1,
    RangeAttack2,
    MeleeAttack1,
    MeleeAttack2,
    Reload,
    Signal,
    VictoryDance,
    Die,
}

/// The gait used when following a route.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Movement {
    #[default]
    Walk,
    Run,
}
impl Movement {
    pub fn activity(self) -> Activity {
        match self {
            Movement::Walk => Activity::Walk,
            Movement::Run => Activity::Run,
        }
    }
}

/// A request from an agent to its body, applied by the world after the agent's think.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyCommand {
    Stop,
    MoveTo { goal: Vec3, movement: Movement },
    SetActivity(Activity),
    FaceTowards(Vec3),
    Speak(&'static str),
    EmitSound {
        class: SoundClass,
        radius: f32,
        duration: f32,
    },
}
impl fmt::Display for BodyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyCommand::Stop => write!(f, "stop"),
            BodyCommand::MoveTo { goal, movement } => write!(f, "{movement:?} to {goal}"),
            BodyCommand::SetActivity(activity) => write!(f, "activity {activity:?}"),
            BodyCommand::FaceTowards(point) => write!(f, "face {point}"),
            BodyCommand::Speak(line) => write!(f, "say {line}"),
            BodyCommand::EmitSound { class, radius, .. } => {
                write!(f, "sound {class:?} r{radius}")
            }
        }
    }
}

/// The queries the engine needs from the level and entity system.
///
/// All calls are synchronous and side-effect free from the engine's point of view.
pub trait WorldQuery {
    /// Traces a ray from `start` to `end`, ignoring `ignore` if given.
    fn trace_line(&self, start: Vec3, end: Vec3, ignore: Option<EntityId>) -> TraceResult;

    /// Sweeps `hull` from `start` to `end`, ignoring `ignore` if given.
    fn trace_hull(&self, start: Vec3, end: Vec3, hull: Hull, ignore: Option<EntityId>)
        -> TraceResult;

    /// Returns the entities whose origin lies within `radius` of `center`.
    fn entities_in_sphere(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Describes an entity, `None` if the handle is stale or the entity was removed.
    fn entity(&self, id: EntityId) -> Option<EntityInfo>;

    /// Returns whether `mover` can find a route to `goal`.
    fn can_reach(&self, mover: EntityId, goal: Vec3) -> bool;

    /// Returns candidate positions hidden from `threat`, within `max_distance` of `near`, best first.
    fn cover_candidates(&self, threat: Vec3, near: Vec3, max_distance: f32) -> Vec<Vec3>;

    /// Status of the route most recently requested for `entity`.
    fn route_status(&self, entity: EntityId) -> RouteStatus;

    /// Whether the activity most recently requested for `entity` has played through.
    fn activity_finished(&self, entity: EntityId) -> bool;

    /// Whether `point` lies below a water surface.
    fn is_underwater(&self, _point: Vec3) -> bool {
        false
    }

    /// Liveness check of a handle.
    fn is_alive(&self, id: EntityId) -> bool {
        self.entity(id).map_or(false, |info| info.alive)
    }

    /// Sounds broadcast at `time`.
    fn active_sounds(&self, _time: f32) -> Vec<SoundEvent> {
        Vec::new()
    }
}
