/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use serde::{Deserialize, Serialize};

use crate::{HitGroup, HitGroupMultipliers, SkillLevel, SkillScale};

/// Parameters of the sensing layer and enemy tracker, distances in world units and times in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SensingConfig {
    /// radius within which hostiles are considered
    pub sensing_radius: f32,
    /// cosine of the half-angle of the field of view
    pub field_of_view: f32,
    /// multiplier of the radius of heard sounds
    pub hearing_sensitivity: f32,
    /// gap between sightings after which an enemy counts as rediscovered
    pub rediscovery_threshold: f32,
    /// an enemy unseen this long may be forgotten...
    pub forget_timeout: f32,
    /// ...if it is also farther than this
    pub forget_distance: f32,
    pub too_far_distance: f32,
    /// time without seeing the enemy before switching to hunting
    pub hunt_delay: f32,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            sensing_radius: 2048.,
            field_of_view: 0.5,
            hearing_sensitivity: 1.,
            rediscovery_threshold: 5.,
            forget_timeout: 10.,
            forget_distance: 512.,
            too_far_distance: 1024.,
            hunt_delay: 3.,
        }
    }
}

/// Default attack eligibility checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CombatConfig {
    pub melee_range: f32,
    pub melee_cone: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub range_cone: f32,
    /// cosine under which facing tasks are considered done
    pub facing_tolerance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            melee_range: 64.,
            melee_cone: 0.7,
            range_min: 64.,
            range_max: 784.,
            range_cone: 0.5,
            facing_tolerance: 0.95,
        }
    }
}

/// Damage policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DamageConfig {
    /// total damage of one event at or above which the victim flinches
    pub flinch_threshold: f32,
    /// health below which a death gibs, unless the damage says otherwise
    pub gib_health: f32,
    pub skill: SkillLevel,
    pub skill_scale: SkillScale,
    pub hit_groups: HitGroupMultipliers,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            flinch_threshold: 20.,
            gib_health: -30.,
            skill: SkillLevel::default(),
            skill_scale: SkillScale::default(),
            hit_groups: HitGroupMultipliers::default(),
        }
    }
}

impl DamageConfig {
    /// Scales a base amount by the hit group and the difficulty.
    pub fn scale(&self, amount: f32, hit_group: HitGroup) -> f32 {
        amount * self.hit_groups.multiplier(hit_group) * self.skill_scale.multiplier(self.skill)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SquadConfig {
    pub max_members: usize,
    /// edge length of the buckets keying position reservations
    pub bucket_size: f32,
    pub reservation_capacity: usize,
    /// minimum time between two lines spoken in a squad
    pub speech_interval: f32,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            max_members: 5,
            bucket_size: 128.,
            reservation_capacity: 8,
            speech_interval: 3.,
        }
    }
}

/// The configuration of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// duration of a simulation tick in seconds
    pub tick_interval: f32,
    /// how many immediately-completing tasks may chain in one tick
    pub max_tasks_per_tick: u32,
    /// optionally, a user-given seed
    pub seed: Option<u64>,
    pub sensing: SensingConfig,
    pub combat: CombatConfig,
    pub damage: DamageConfig,
    pub squad: SquadConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: 0.1,
            max_tasks_per_tick: 10,
            seed: None,
            sensing: Default::default(),
            combat: Default::default(),
            damage: Default::default(),
            squad: Default::default(),
        }
    }
}
