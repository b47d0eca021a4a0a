/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    Activity, ActiveSchedule, Classification, Conditions, DamageFlags, Damageable, EnemyRef,
    EntityId, Memory, Movement, SoundEvent, SquadId, SquadSlots,
};

/// The life-cycle state of an agent, which decides the list of schedules it selects from.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonsterState {
    #[default]
    Idle,
    Alert,
    Combat,
    Hunt,
    Prone,
    Scripted,
    Dead,
}

impl MonsterState {
    pub const ALL: [MonsterState; 7] = [
        MonsterState::Idle,
        MonsterState::Alert,
        MonsterState::Combat,
        MonsterState::Hunt,
        MonsterState::Prone,
        MonsterState::Scripted,
        MonsterState::Dead,
    ];

    /// States that only an external call can leave.
    pub fn is_external(self) -> bool {
        matches!(
            self,
            MonsterState::Prone | MonsterState::Scripted | MonsterState::Dead
        )
    }
}

/// The ammunition of a weapon that needs reloading.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    pub current: u32,
    pub max: u32,
}
impl Clip {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }
    pub fn is_empty(&self) -> bool {
        self.current == 0
    }
    /// Uses one round, returns false if the clip was empty.
    pub fn consume(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }
    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

/// The scheduling and combat state of one non-player character.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: EntityId,
    pub classification: Classification,
    pub state: MonsterState,
    /// the state to adopt when no stimulus decides otherwise
    pub ideal_state: MonsterState,
    /// facts of the current tick, recomputed from scratch by the sensing pass
    pub conditions: Conditions,
    /// damage conditions raised by hits since the last schedule selection
    pub pending_damage: Conditions,
    pub memory: Memory,
    pub active: Option<ActiveSchedule>,
    /// failure schedule set by a task for the remainder of the current schedule
    pub fail_override: Option<&'static str>,
    /// end time of the running wait task
    pub task_deadline: f32,
    pub enemy: Option<EnemyRef>,
    pub previous_enemy: Option<EnemyRef>,
    pub last_seen_enemy: Option<f32>,
    pub first_seen_enemy: Option<f32>,
    /// whether the one-time alert reaction may be played
    pub alert_armed: bool,
    pub health: f32,
    pub max_health: f32,
    pub activity: Activity,
    pub movement: Movement,
    pub route_goal: Option<Vec3>,
    pub squad: Option<SquadId>,
    /// the squad slot held for the current schedule
    pub squad_slot: SquadSlots,
    pub last_damage: DamageFlags,
    pub last_attacker: Option<EntityId>,
    pub best_sound: Option<SoundEvent>,
    pub clip: Option<Clip>,
    pub gibbed: bool,
}

impl Agent {
    pub fn new(id: EntityId, classification: Classification, health: f32) -> Self {
        Self {
            id,
            classification,
            state: MonsterState::Idle,
            ideal_state: MonsterState::Idle,
            conditions: Conditions::empty(),
            pending_damage: Conditions::empty(),
            memory: Memory::empty(),
            active: None,
            fail_override: None,
            task_deadline: 0.,
            enemy: None,
            previous_enemy: None,
            last_seen_enemy: None,
            first_seen_enemy: None,
            alert_armed: false,
            health,
            max_health: health,
            activity: Activity::Idle,
            movement: Movement::Walk,
            route_goal: None,
            squad: None,
            squad_slot: SquadSlots::empty(),
            last_damage: DamageFlags::empty(),
            last_attacker: None,
            best_sound: None,
            clip: None,
            gibbed: false,
        }
    }

    pub fn with_clip(mut self, size: u32) -> Self {
        self.clip = Some(Clip::full(size));
        self
    }

    pub fn with_state(mut self, state: MonsterState) -> Self {
        self.state = state;
        self.ideal_state = state;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.state != MonsterState::Dead
    }

    pub fn schedule_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(ActiveSchedule::name)
    }

    /// Whether the agent is running the schedule with the given name.
    pub fn is_running(&self, name: &str) -> bool {
        self.schedule_name() == Some(name)
    }

    /// Forces a life-cycle state from outside, e.g. for scripted sequences; abandons the schedule.
    pub fn set_state(&mut self, state: MonsterState) {
        if self.state != state {
            log::debug!("{}: state {:?} -> {:?} (external)", self.id, self.state, state);
            self.active = None;
        }
        self.state = state;
        self.ideal_state = state;
    }

    /// Drops the active schedule, the next selection starts from a clean slate.
    pub fn clear_schedule(&mut self) {
        self.active = None;
        self.fail_override = None;
    }

    pub fn remember(&mut self, memory: Memory) {
        self.memory |= memory;
    }

    pub fn forget(&mut self, memory: Memory) {
        self.memory.remove(memory);
    }

    pub fn has_memory(&self, memory: Memory) -> bool {
        self.memory.contains(memory)
    }
}

impl Damageable for Agent {
    fn health(&self) -> f32 {
        self.health
    }

    fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    fn takes_damage(&self) -> bool {
        self.is_alive()
    }

    fn hurt(&mut self, attacker: Option<EntityId>, _amount: f32, flags: DamageFlags, flinch: bool) {
        self.pending_damage |= Conditions::LIGHT_DAMAGE;
        if flinch {
            self.pending_damage |= Conditions::HEAVY_DAMAGE;
        }
        self.last_damage = flags;
        if attacker.is_some() {
            self.last_attacker = attacker;
            self.memory |= Memory::PROVOKED;
        }
    }

    fn killed(&mut self, attacker: Option<EntityId>, gib: bool, flags: DamageFlags) {
        log::info!(
            "{} killed by {}{}",
            self.id,
            attacker.map_or_else(|| "the world".to_owned(), |id| id.to_string()),
            if gib { " (gibbed)" } else { "" }
        );
        self.state = MonsterState::Dead;
        self.ideal_state = MonsterState::Dead;
        self.clear_schedule();
        self.conditions = Conditions::empty();
        self.pending_damage = Conditions::empty();
        self.memory |= Memory::KILLED;
        self.last_damage = flags;
        self.last_attacker = attacker;
        self.gibbed = gib;
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} hp {}", self.id, self.state, self.health)?;
        if let Some(active) = &self.active {
            write!(f, " {active}")?;
        }
        Ok(())
    }
}
