/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use rustc_hash::FxHashMap;

use crate::{
    Agent, EngineError, MonsterState, Result, Schedule, ScheduleRule, SquadRecord, BASE_RULES,
    BASE_SCHEDULES, FAIL,
};

/// The named schedules known to a behavior and the per-state rules selecting among them.
///
/// Names are stable: they are what persisted agents refer to.
#[derive(Clone, Default)]
pub struct ScheduleRepository {
    schedules: FxHashMap<&'static str, &'static Schedule>,
    rules: FxHashMap<MonsterState, Vec<ScheduleRule>>,
}

impl ScheduleRepository {
    /// A repository without any schedule, not even the failure one.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The base library of schedules and rules.
    pub fn base() -> Self {
        let mut repository = Self::empty();
        for schedule in BASE_SCHEDULES {
            // names of the base library are unique
            let _ = repository.register(schedule);
        }
        for rule in BASE_RULES {
            repository.rules.entry(rule.state).or_default().push(*rule);
        }
        repository
    }

    /// Registers a schedule under its name.
    ///
    /// Registering the same schedule twice is fine, registering two different
    /// schedules with the same name is an error.
    pub fn register(&mut self, schedule: &'static Schedule) -> Result<()> {
        match self.schedules.get(schedule.name) {
            Some(existing) if !std::ptr::eq(*existing, schedule) => {
                Err(EngineError::DuplicateSchedule(schedule.name))
            }
            _ => {
                self.schedules.insert(schedule.name, schedule);
                Ok(())
            }
        }
    }

    pub fn register_all(&mut self, schedules: &[&'static Schedule]) -> Result<()> {
        schedules
            .iter()
            .try_for_each(|schedule| self.register(schedule))
    }

    /// Adds rules taking precedence over the existing ones of their state, keeping their order.
    ///
    /// The schedules of the rules are registered as well.
    pub fn prepend_rules(&mut self, rules: &[ScheduleRule]) -> Result<()> {
        for state in MonsterState::ALL {
            let mut new_rules = Vec::new();
            for rule in rules.iter().filter(|rule| rule.state == state) {
                self.register(rule.schedule)?;
                new_rules.push(*rule);
            }
            if new_rules.is_empty() {
                continue;
            }
            let existing = self.rules.entry(state).or_default();
            new_rules.append(existing);
            *existing = new_rules;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&'static Schedule> {
        self.schedules.get(name).copied()
    }

    /// Looks a schedule up by name, failing with [EngineError::UnknownSchedule].
    pub fn resolve(&self, name: &str) -> Result<&'static Schedule> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownSchedule(name.to_owned()))
    }

    pub fn rules(&self, state: MonsterState) -> &[ScheduleRule] {
        self.rules.get(&state).map_or(&[][..], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schedules.keys().copied()
    }

    /// Checks that every state has an unconditional rule and that all failure schedules exist.
    pub fn validate(&self) -> Result<()> {
        for state in MonsterState::ALL {
            if !self.rules(state).iter().any(ScheduleRule::is_unconditional) {
                return Err(EngineError::MissingFallback(state));
            }
        }
        for schedule in self.schedules.values() {
            if let Some(failure) = schedule.failure {
                self.resolve(failure)?;
            }
        }
        self.resolve(FAIL.name)?;
        Ok(())
    }

    /// The first unconditional schedule of `state`, the idle loop of that state.
    pub fn fallback(&self, state: MonsterState) -> &'static Schedule {
        self.rules(state)
            .iter()
            .find(|rule| rule.is_unconditional())
            .map_or(&FAIL, |rule| rule.schedule)
    }

    /// The schedule to switch to when a task of `schedule` fails.
    ///
    /// In order: the override set by a task, the failure schedule of `schedule`, `fail`.
    /// If `schedule` is itself a failure schedule, the fallback of `state` is used instead.
    pub fn failure_schedule(
        &self,
        schedule: &Schedule,
        fail_override: Option<&str>,
        state: MonsterState,
    ) -> &'static Schedule {
        if schedule.is_failure {
            return self.fallback(state);
        }
        let name = fail_override.or(schedule.failure).unwrap_or(FAIL.name);
        match self.get(name) {
            Some(failure) => failure,
            None => {
                log::warn!("Unknown failure schedule {name} of {}", schedule.name);
                self.get(FAIL.name).unwrap_or(&FAIL)
            }
        }
    }

    /// Picks the schedule `agent` should run given its current conditions.
    ///
    /// The running schedule is kept unless one of its interrupts is set. Otherwise, the
    /// first rule of the agent's state that matches wins; if the rule claims a squad
    /// slot, the slot is occupied in `squad` and recorded in the agent.
    pub fn select_schedule(
        &self,
        agent: &mut Agent,
        mut squad: Option<&mut SquadRecord>,
    ) -> &'static Schedule {
        if let Some(active) = &agent.active {
            if !active.is_finished() && !active.schedule.is_interrupted(agent.conditions) {
                return active.schedule;
            }
        }
        if let Some(squad) = squad.as_deref_mut() {
            squad.vacate_slot(agent.id);
        }
        agent.squad_slot = Default::default();
        for rule in self.rules(agent.state) {
            if !rule.matches(agent.conditions, agent.memory) {
                continue;
            }
            if !rule.slot.is_empty() {
                if let Some(squad) = squad.as_deref_mut() {
                    match squad.occupy_slot(agent.id, rule.slot) {
                        Some(slot) => agent.squad_slot = slot,
                        None => continue,
                    }
                }
            }
            return rule.schedule;
        }
        debug_assert!(
            false,
            "no schedule for {} in state {:?}",
            agent.id, agent.state
        );
        log::error!(
            "{}: no schedule matches in state {:?}, using {}",
            agent.id,
            agent.state,
            FAIL.name
        );
        self.get(FAIL.name).unwrap_or(&FAIL)
    }
}
