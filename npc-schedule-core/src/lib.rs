/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

//! This is the core of the NPC schedule engine, the shared behavior scheduling and
//! combat-resolution layer that non-player characters run against.
//!
//! Each tick, for each agent, [run_ai] evaluates a fresh set of [Conditions] from the
//! world (through the [WorldQuery] facade), updates the enemy and the life-cycle
//! [MonsterState], keeps or replaces the active [Schedule] according to its interrupt mask
//! and the selection rules of a [ScheduleRepository], and runs the [Task]s of the schedule.
//! Effects on bodies are queued as [BodyCommand]s, and damage is collected in a
//! [MultiDamage] ledger whose [DamageEvent]s are committed once the agent is done.
//! Agents of a squad share their enemy and coordinate through a [SquadRecord].
//!
//! Type-specific behaviors implement [MonsterBehavior] and extend the base library
//! ([BASE_SCHEDULES] and [BASE_RULES]) with their own schedules.
//!
//! An update loop driving all agents of a world, and a simple reference world, are available
//! in the `npc-schedule-utils` crate.

mod active_schedule;
mod agent;
mod behavior;
mod condition;
mod config;
mod context;
mod damage;
mod enemy;
mod error;
mod handle;
mod persistence;
mod relationship;
mod repository;
mod schedule;
mod schedules;
mod sensing;
mod sound;
mod squad;
mod task;
mod task_executor;
mod world;

pub use active_schedule::*;
pub use agent::*;
pub use behavior::*;
pub use condition::*;
pub use config::*;
pub use context::*;
pub use damage::*;
pub use enemy::*;
pub use error::*;
pub use handle::*;
pub use persistence::*;
pub use relationship::*;
pub use repository::*;
pub use schedule::*;
pub use schedules::*;
pub use sensing::*;
pub use sound::*;
pub use squad::*;
pub use task::*;
pub use task_executor::*;
pub use world::*;
