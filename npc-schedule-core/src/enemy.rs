/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{Agent, EntityId, Relationship, SensingConfig, WorldQuery};

/// A weak reference to an enemy, with what the agent knows about it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnemyRef {
    /// generation-checked handle, stale once the enemy is removed
    pub handle: EntityId,
    pub last_known_position: Vec3,
    /// relationship at acquisition time
    pub relationship: Relationship,
}

impl EnemyRef {
    pub fn new(handle: EntityId, last_known_position: Vec3, relationship: Relationship) -> Self {
        Self {
            handle,
            last_known_position,
            relationship,
        }
    }
}

impl Agent {
    /// Makes `enemy` the current enemy, keeping the current one as previous enemy.
    ///
    /// Returns false if `enemy` already is the current enemy, in which case only its
    /// last known position is updated.
    pub fn set_enemy(&mut self, enemy: EnemyRef) -> bool {
        if let Some(current) = &mut self.enemy {
            if current.handle == enemy.handle {
                current.last_known_position = enemy.last_known_position;
                return false;
            }
        }
        log::debug!("{}: new enemy {}", self.id, enemy.handle);
        self.previous_enemy = self.enemy.replace(enemy);
        self.last_seen_enemy = None;
        self.first_seen_enemy = None;
        self.alert_armed = false;
        true
    }

    /// Drops the current enemy, restoring the previous one if it is still alive.
    ///
    /// Returns whether an enemy remains.
    pub fn pop_enemy(&mut self, world: &dyn WorldQuery) -> bool {
        self.enemy = None;
        self.last_seen_enemy = None;
        self.first_seen_enemy = None;
        self.alert_armed = false;
        if let Some(previous) = self.previous_enemy.take() {
            if world.is_alive(previous.handle) {
                log::debug!("{}: back to enemy {}", self.id, previous.handle);
                self.enemy = Some(previous);
            }
        }
        self.enemy.is_some()
    }

    /// Records a sighting of the current enemy at `time`.
    ///
    /// If the previous sighting is older than `rediscovery_threshold`, the enemy counts as
    /// rediscovered: the first-seen time is refreshed and the alert reaction is armed again.
    pub fn update_last_seen(&mut self, position: Vec3, time: f32, rediscovery_threshold: f32) {
        let Some(enemy) = &mut self.enemy else {
            return;
        };
        enemy.last_known_position = position;
        let rediscovered = self
            .last_seen_enemy
            .map_or(true, |last_seen| time - last_seen > rediscovery_threshold);
        if rediscovered {
            self.first_seen_enemy = Some(time);
            self.alert_armed = true;
        }
        self.last_seen_enemy = Some(time);
    }

    /// Consumes the alert reaction, returns whether it was armed.
    pub fn take_alert_reaction(&mut self) -> bool {
        std::mem::take(&mut self.alert_armed)
    }

    /// Seconds since the current enemy was last seen, infinite if never.
    pub fn time_since_enemy_seen(&self, time: f32) -> f32 {
        self.last_seen_enemy
            .map_or(f32::INFINITY, |last_seen| time - last_seen)
    }

    /// Whether the current enemy has been unseen long enough and is far enough to be forgotten.
    pub fn should_forget_enemy(&self, position: Vec3, time: f32, config: &SensingConfig) -> bool {
        let Some(enemy) = &self.enemy else {
            return false;
        };
        self.time_since_enemy_seen(time) > config.forget_timeout
            && position.distance(enemy.last_known_position) > config.forget_distance
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::*;

    fn agent() -> Agent {
        Agent::new(EntityId::new(0, 0), Classification::HumanMilitary, 50.)
    }

    fn enemy(index: u32) -> EnemyRef {
        EnemyRef::new(EntityId::new(index, 0), Vec3::ZERO, Relationship::Hate)
    }

    #[test]
    fn alert_once_per_rediscovery() {
        let mut agent = agent();
        agent.set_enemy(enemy(1));
        agent.update_last_seen(Vec3::ZERO, 0., 5.);
        assert!(agent.take_alert_reaction());
        agent.update_last_seen(Vec3::ZERO, 1., 5.);
        assert!(!agent.take_alert_reaction());
        agent.update_last_seen(Vec3::ZERO, 7., 5.);
        assert_eq!(agent.first_seen_enemy, Some(7.));
        assert!(agent.take_alert_reaction());
        assert!(!agent.take_alert_reaction());
    }

    #[test]
    fn forget_needs_time_and_distance() {
        let config = SensingConfig::default();
        let mut agent = agent();
        agent.set_enemy(enemy(1));
        agent.update_last_seen(Vec3::ZERO, 0., 5.);
        assert!(!agent.should_forget_enemy(Vec3::new(1000., 0., 0.), 5., &config));
        assert!(!agent.should_forget_enemy(Vec3::new(100., 0., 0.), 20., &config));
        assert!(agent.should_forget_enemy(Vec3::new(1000., 0., 0.), 20., &config));
    }

    #[test]
    fn switching_keeps_previous() {
        let mut agent = agent();
        assert!(agent.set_enemy(enemy(1)));
        assert!(!agent.set_enemy(enemy(1)));
        assert!(agent.set_enemy(enemy(2)));
        assert_eq!(agent.previous_enemy.map(|e| e.handle), Some(EntityId::new(1, 0)));
    }
}
