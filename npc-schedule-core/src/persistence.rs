/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    Activity, ActiveSchedule, Agent, Classification, Clip, Conditions, DamageFlags, EnemyRef,
    EntityId, Memory, MonsterState, Movement, Result, ScheduleRepository, SoundEvent, SquadId,
    SquadSlots, TaskStatus,
};

/// The persistent part of an [Agent].
///
/// Schedules are stored by name and resolved against a repository when restoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AgentSnapshot {
    pub id: EntityId,
    pub classification: Classification,
    pub state: MonsterState,
    pub ideal_state: MonsterState,
    pub conditions: Conditions,
    pub pending_damage: Conditions,
    pub memory: Memory,
    pub schedule: Option<String>,
    pub task_index: usize,
    pub task_status: TaskStatus,
    pub fail_override: Option<String>,
    pub task_deadline: f32,
    pub enemy: Option<EnemyRef>,
    pub previous_enemy: Option<EnemyRef>,
    pub last_seen_enemy: Option<f32>,
    pub first_seen_enemy: Option<f32>,
    pub alert_armed: bool,
    pub health: f32,
    pub max_health: f32,
    pub activity: Activity,
    pub movement: Movement,
    pub route_goal: Option<Vec3>,
    pub squad: Option<SquadId>,
    pub squad_slot: SquadSlots,
    pub last_damage: DamageFlags,
    pub last_attacker: Option<EntityId>,
    pub best_sound: Option<SoundEvent>,
    pub clip: Option<Clip>,
    pub gibbed: bool,
}

impl Agent {
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            classification: self.classification,
            state: self.state,
            ideal_state: self.ideal_state,
            conditions: self.conditions,
            pending_damage: self.pending_damage,
            memory: self.memory,
            schedule: self.active.map(|active| active.name().to_owned()),
            task_index: self.active.map_or(0, |active| active.task_index),
            task_status: self
                .active
                .map_or(TaskStatus::NotStarted, |active| active.status),
            fail_override: self.fail_override.map(str::to_owned),
            task_deadline: self.task_deadline,
            enemy: self.enemy,
            previous_enemy: self.previous_enemy,
            last_seen_enemy: self.last_seen_enemy,
            first_seen_enemy: self.first_seen_enemy,
            alert_armed: self.alert_armed,
            health: self.health,
            max_health: self.max_health,
            activity: self.activity,
            movement: self.movement,
            route_goal: self.route_goal,
            squad: self.squad,
            squad_slot: self.squad_slot,
            last_damage: self.last_damage,
            last_attacker: self.last_attacker,
            best_sound: self.best_sound,
            clip: self.clip,
            gibbed: self.gibbed,
        }
    }

    /// Rebuilds an agent, failing if a schedule name is unknown to `repository`.
    ///
    /// A task index past the end of the schedule restores as a finished schedule.
    pub fn restore(snapshot: &AgentSnapshot, repository: &ScheduleRepository) -> Result<Agent> {
        let active = match &snapshot.schedule {
            Some(name) => {
                let schedule = repository.resolve(name)?;
                let active = ActiveSchedule {
                    schedule,
                    task_index: snapshot.task_index,
                    status: snapshot.task_status,
                };
                (!active.is_finished()).then_some(active)
            }
            None => None,
        };
        let fail_override = match &snapshot.fail_override {
            Some(name) => Some(repository.resolve(name)?.name),
            None => None,
        };
        Ok(Agent {
            id: snapshot.id,
            classification: snapshot.classification,
            state: snapshot.state,
            ideal_state: snapshot.ideal_state,
            conditions: snapshot.conditions,
            pending_damage: snapshot.pending_damage,
            memory: snapshot.memory,
            active,
            fail_override,
            task_deadline: snapshot.task_deadline,
            enemy: snapshot.enemy,
            previous_enemy: snapshot.previous_enemy,
            last_seen_enemy: snapshot.last_seen_enemy,
            first_seen_enemy: snapshot.first_seen_enemy,
            alert_armed: snapshot.alert_armed,
            health: snapshot.health,
            max_health: snapshot.max_health,
            activity: snapshot.activity,
            movement: snapshot.movement,
            route_goal: snapshot.route_goal,
            squad: snapshot.squad,
            squad_slot: snapshot.squad_slot,
            last_damage: snapshot.last_damage,
            last_attacker: snapshot.last_attacker,
            best_sound: snapshot.best_sound,
            clip: snapshot.clip,
            gibbed: snapshot.gibbed,
        })
    }
}
