/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use crate::{Conditions, Memory, MonsterState, SoundClass, SquadSlots, Task};

/// A named, immutable, ordered list of tasks with the conditions that interrupt it.
///
/// Schedules are static data shared by all agents; agents and save games refer to
/// them by [name](Self::name), which must therefore stay stable.
pub struct Schedule {
    pub name: &'static str,
    pub tasks: &'static [Task],
    /// conditions that, if any is set, abandon the schedule
    pub interrupts: Conditions,
    /// sound classes that raise `HEAR_SOUND` while this schedule runs, all if empty
    pub sounds: SoundClass,
    /// the schedule to run when a task fails, the repository default if `None`
    pub failure: Option<&'static str>,
    /// whether this schedule is itself a failure schedule
    pub is_failure: bool,
}

impl Schedule {
    pub const fn new(name: &'static str, tasks: &'static [Task]) -> Self {
        Self {
            name,
            tasks,
            interrupts: Conditions::empty(),
            sounds: SoundClass::empty(),
            failure: None,
            is_failure: false,
        }
    }

    pub const fn interrupted_by(self, interrupts: Conditions) -> Self {
        Self { interrupts, ..self }
    }

    pub const fn hearing(self, sounds: SoundClass) -> Self {
        Self { sounds, ..self }
    }

    pub const fn failing_to(self, failure: &'static str) -> Self {
        Self {
            failure: Some(failure),
            ..self
        }
    }

    pub const fn recovery(self) -> Self {
        Self {
            is_failure: true,
            ..self
        }
    }

    /// Returns whether any of `conditions` interrupts this schedule.
    pub fn is_interrupted(&self, conditions: Conditions) -> bool {
        self.interrupts.intersects(conditions)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Schedule {}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("name", &self.name)
            .field("tasks", &self.tasks.len())
            .field("interrupts", &self.interrupts)
            .finish()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One candidate of the selection list of a life-cycle state.
#[derive(Clone, Copy, Debug)]
pub struct ScheduleRule {
    pub state: MonsterState,
    /// all of these must be set
    pub required: Conditions,
    /// none of these may be set
    pub forbidden: Conditions,
    /// none of these may be remembered
    pub forbidden_memory: Memory,
    /// if in a squad, one of these slots must be available
    pub slot: SquadSlots,
    pub schedule: &'static Schedule,
}

impl ScheduleRule {
    pub const fn new(state: MonsterState, schedule: &'static Schedule) -> Self {
        Self {
            state,
            required: Conditions::empty(),
            forbidden: Conditions::empty(),
            forbidden_memory: Memory::empty(),
            slot: SquadSlots::empty(),
            schedule,
        }
    }

    pub const fn requires(self, required: Conditions) -> Self {
        Self { required, ..self }
    }

    pub const fn forbids(self, forbidden: Conditions) -> Self {
        Self { forbidden, ..self }
    }

    pub const fn forbids_memory(self, forbidden_memory: Memory) -> Self {
        Self {
            forbidden_memory,
            ..self
        }
    }

    pub const fn claims_slot(self, slot: SquadSlots) -> Self {
        Self { slot, ..self }
    }

    /// A rule that always matches, as needed for the last rule of every state.
    pub fn is_unconditional(&self) -> bool {
        self.required.is_empty()
            && self.forbidden.is_empty()
            && self.forbidden_memory.is_empty()
            && self.slot.is_empty()
    }

    /// Whether the condition and memory parts of the rule match; slots are checked by the caller.
    pub fn matches(&self, conditions: Conditions, memory: Memory) -> bool {
        conditions.contains(self.required)
            && !conditions.intersects(self.forbidden)
            && !memory.intersects(self.forbidden_memory)
    }
}
