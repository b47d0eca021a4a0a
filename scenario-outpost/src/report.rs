/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::collections::{BTreeMap, HashMap};

use npc_schedule_core::{Agent, BodyCommand, DamageEvent, DamageOutcome, EntityId};
use npc_schedule_utils::ExecutorState;
use serde::Serialize;

/// The side of passive targets, which do not fight.
pub const TARGET_SIDE: &str = "target";

/// Statistics of all the entities sharing a behavior.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SideReport {
    pub spawned: usize,
    pub deaths: usize,
    pub gibbed: usize,
    /// raw damage of all hits of this side
    pub damage_dealt: f32,
    /// damage actually applied to this side
    pub damage_taken: f32,
}

impl SideReport {
    pub fn survivors(&self) -> usize {
        self.spawned.saturating_sub(self.deaths)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kill {
    pub tick: u64,
    pub victim: EntityId,
    pub attacker: Option<EntityId>,
    pub gib: bool,
}

/// What happened during one run, collected through the executor hooks.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Report {
    pub run: usize,
    pub seed: Option<u64>,
    pub ticks: u64,
    /// the only side with fighters left, if any
    pub winner: Option<String>,
    pub sides: BTreeMap<String, SideReport>,
    pub kills: Vec<Kill>,
    /// how many times each schedule was started
    pub schedules: BTreeMap<&'static str, usize>,
    #[serde(skip)]
    membership: HashMap<EntityId, &'static str>,
    #[serde(skip)]
    running: HashMap<EntityId, &'static str>,
}

impl Report {
    pub fn new(run: usize, seed: Option<u64>) -> Self {
        Self {
            run,
            seed,
            ticks: 0,
            winner: None,
            sides: BTreeMap::new(),
            kills: Vec::new(),
            schedules: BTreeMap::new(),
            membership: HashMap::new(),
            running: HashMap::new(),
        }
    }

    /// Records that `id` fights for `side`.
    pub fn enlist(&mut self, id: EntityId, side: &'static str) {
        self.membership.insert(id, side);
        self.sides.entry(side.to_owned()).or_default().spawned += 1;
    }

    pub fn side_of(&self, id: EntityId) -> Option<&'static str> {
        self.membership.get(&id).copied()
    }

    /// The fighting sides, targets excluded.
    pub fn fighting_sides(&self) -> impl Iterator<Item = (&String, &SideReport)> {
        self.sides.iter().filter(|(name, _)| *name != TARGET_SIDE)
    }

    /// Closes the report after `ticks` ticks and names the winner.
    pub fn finish(&mut self, ticks: u64) {
        self.ticks = ticks;
        let fighting = self.fighting_sides().count();
        let standing: Vec<String> = self
            .fighting_sides()
            .filter(|(_, side)| side.survivors() > 0)
            .map(|(name, _)| name.clone())
            .collect();
        self.winner = match standing.as_slice() {
            [winner] if fighting > 1 => Some(winner.clone()),
            _ => None,
        };
    }

    /// Whether at most one fighting side is left standing, when several fought.
    pub fn is_decided(&self) -> bool {
        self.fighting_sides().count() > 1
            && self
                .fighting_sides()
                .filter(|(_, side)| side.survivors() > 0)
                .count()
                <= 1
    }
}

impl ExecutorState for Report {
    fn post_think_hook(&mut self, _tick: u64, agent: &Agent, _commands: &[BodyCommand]) {
        let Some(name) = agent.schedule_name() else {
            self.running.remove(&agent.id);
            return;
        };
        if self.running.insert(agent.id, name) != Some(name) {
            *self.schedules.entry(name).or_default() += 1;
        }
    }

    fn post_damage_hook(&mut self, tick: u64, event: &DamageEvent, outcome: DamageOutcome) {
        let (amount, killed, gib) = match outcome {
            DamageOutcome::Hurt { amount, .. } => (amount, false, false),
            DamageOutcome::Killed { amount, gib } => (amount, true, gib),
            DamageOutcome::Ignored | DamageOutcome::Absorbed => return,
        };
        for contribution in event.contributions() {
            let side = contribution.attacker.and_then(|id| self.side_of(id));
            if let Some(side) = side.and_then(|side| self.sides.get_mut(side)) {
                side.damage_dealt += contribution.amount;
            }
        }
        let victim = event.victim();
        if let Some(side) = self.side_of(victim).and_then(|side| self.sides.get_mut(side)) {
            side.damage_taken += amount;
            if killed {
                side.deaths += 1;
                if gib {
                    side.gibbed += 1;
                }
            }
        }
        if killed {
            let attacker = event
                .contributions()
                .iter()
                .rev()
                .find_map(|contribution| contribution.attacker);
            log::info!("T{tick}: {victim} killed by {attacker:?}");
            self.kills.push(Kill {
                tick,
                victim,
                attacker,
                gib,
            });
        }
    }

    fn keep_agent(&self, _tick: u64, agent: &Agent) -> bool {
        agent.is_alive()
    }
}

/// Aggregated outcome of a batch of runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Summary {
    pub runs: usize,
    pub wins: BTreeMap<String, usize>,
    pub undecided: usize,
    pub mean_ticks: f32,
    pub mean_survivors: BTreeMap<String, f32>,
}

impl Summary {
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut summary = Summary {
            runs: reports.len(),
            ..Default::default()
        };
        if reports.is_empty() {
            return summary;
        }
        let runs = reports.len() as f32;
        for report in reports {
            match &report.winner {
                Some(winner) => *summary.wins.entry(winner.clone()).or_default() += 1,
                None => summary.undecided += 1,
            }
            summary.mean_ticks += report.ticks as f32 / runs;
            for (name, side) in &report.sides {
                *summary.mean_survivors.entry(name.clone()).or_default() +=
                    side.survivors() as f32 / runs;
            }
        }
        summary
    }
}
