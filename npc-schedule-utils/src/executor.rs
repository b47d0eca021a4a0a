/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::collections::BTreeMap;

use ansi_term::Style;
use npc_schedule_core::{
    run_ai, Agent, BodyCommand, Context, CosmeticEffect, DamageEvent, DamageOutcome, Damageable,
    EngineConfig, EntityId, MonsterBehavior, MultiDamage, SquadId, Squads, WorldQuery,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn highlight_style() -> Style {
    ansi_term::Style::new().bold().fg(ansi_term::Colour::Green)
}
fn highlight_tick(tick: u64) -> String {
    let tick_text = format!("T{}", tick);
    highlight_style().paint(&tick_text).to_string()
}
fn highlight_agent(id: EntityId) -> String {
    let agent_text = format!("{}", id);
    highlight_style().paint(&agent_text).to_string()
}

/// A world that can be driven by the executor, on top of answering the engine's queries.
pub trait ExecutorWorld: WorldQuery {
    /// Applies the commands queued by `agent` during its think.
    fn apply_commands(&mut self, agent: EntityId, commands: &[BodyCommand]);
    /// Returns the damageable entity behind `id`, for victims that are not agents (by default none).
    fn damageable(&mut self, _id: EntityId) -> Option<&mut dyn Damageable> {
        None
    }
    /// Method called once a damage event landed, with the health left to the victim (by default do nothing)
    fn on_damage(&mut self, _victim: EntityId, _outcome: DamageOutcome, _health: f32) {}
    /// Renders the cosmetic effects of the tick (by default do nothing)
    fn render_effects(&mut self, _effects: &[CosmeticEffect]) {}
    /// Moves the world forward to `time`, `dt` seconds after the previous tick.
    fn advance(&mut self, time: f32, dt: f32);
}

/// User-defined properties for the executor, consisting of a set of
/// helper functions.
pub trait ExecutorState {
    /// Method called after each think, to perform tasks such as visual updates (by default do nothing)
    fn post_think_hook(&mut self, _tick: u64, _agent: &Agent, _commands: &[BodyCommand]) {}
    /// Method called after each committed damage event (by default do nothing)
    fn post_damage_hook(&mut self, _tick: u64, _event: &DamageEvent, _outcome: DamageOutcome) {}
    /// Returns whether an agent should be kept (to remove corpses) (by default returns true)
    fn keep_agent(&self, _tick: u64, _agent: &Agent) -> bool {
        true
    }
}

impl ExecutorState for () {}

/// An agent along with the behavior of its monster type.
pub struct AgentEntry {
    pub agent: Agent,
    pub behavior: &'static dyn MonsterBehavior,
}

/// A single-threaded, tick-driven executor.
///
/// Each tick, agents think in handle order. The commands of an agent are applied to the
/// world and its damage is committed before the next agent thinks.
pub struct SimpleExecutor<'a, W, S>
where
    W: ExecutorWorld,
    S: ExecutorState,
{
    config: EngineConfig,
    /// The state of this executor
    executor_state: &'a mut S,
    /// The world the agents live in
    world: W,
    agents: BTreeMap<EntityId, AgentEntry>,
    squads: Squads,
    damage: MultiDamage,
    rng: ChaCha8Rng,
    tick: u64,
    time: f32,
}

impl<'a, W, S> SimpleExecutor<'a, W, S>
where
    W: ExecutorWorld,
    S: ExecutorState,
{
    /// Creates a new executor, seeding its random number generator from the configuration if given.
    pub fn new(config: EngineConfig, world: W, executor_state: &'a mut S) -> Self {
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            config,
            executor_state,
            world,
            agents: BTreeMap::new(),
            squads: Squads::new(),
            damage: MultiDamage::new(),
            rng,
            tick: 0,
            time: 0.,
        }
    }

    pub fn add_agent(&mut self, agent: Agent, behavior: &'static dyn MonsterBehavior) {
        log::debug!("Adding {} as a {}", agent.id, behavior.name());
        self.agents.insert(agent.id, AgentEntry { agent, behavior });
    }

    /// Groups agents into a squad, the first one leading; returns `None` if any of them
    /// is unknown or already in a squad.
    pub fn form_squad(&mut self, members: &[EntityId]) -> Option<SquadId> {
        let free = members.iter().all(|id| {
            self.agents
                .get(id)
                .map_or(false, |entry| entry.agent.squad.is_none())
        });
        if !free {
            return None;
        }
        let squad = self.squads.form(members, &self.config.squad)?;
        if let Some(record) = self.squads.get(squad) {
            for id in record.members() {
                if let Some(entry) = self.agents.get_mut(id) {
                    entry.agent.squad = Some(squad);
                }
            }
        }
        Some(squad)
    }

    /// Removes an agent, leaving its squad if any.
    pub fn remove_agent(&mut self, id: EntityId) -> Option<Agent> {
        let entry = self.agents.remove(&id)?;
        if let Some(squad) = entry.agent.squad {
            self.squads.leave(squad, id);
        }
        Some(entry.agent)
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id).map(|entry| &entry.agent)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.get_mut(&id).map(|entry| &mut entry.agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().map(|entry| &entry.agent)
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn squads(&self) -> &Squads {
        &self.squads
    }

    pub fn state(&self) -> &S {
        &*self.executor_state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Runs `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Executes one tick for all agents.
    pub fn step(&mut self) {
        let tick = self.tick;
        let time = self.time;
        self.damage.begin_tick(tick);
        let sounds = self.world.active_sounds(time);
        let ids: Vec<EntityId> = self.agents.keys().copied().collect();
        for id in ids {
            let keep = match self.agents.get(&id) {
                Some(entry) => self.executor_state.keep_agent(tick, &entry.agent),
                None => continue,
            };
            if !keep {
                log::info!("{} {} removed", highlight_tick(tick), highlight_agent(id));
                self.remove_agent(id);
                continue;
            }
            let commands = self.think(id, &sounds);
            if let Some(entry) = self.agents.get(&id) {
                if log::log_enabled!(log::Level::Info) && !commands.is_empty() {
                    let commands_text = commands
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    log::info!(
                        "{} {} in {}: {}",
                        highlight_tick(tick),
                        highlight_agent(id),
                        entry.agent.schedule_name().unwrap_or("no schedule"),
                        commands_text
                    );
                }
                self.executor_state
                    .post_think_hook(tick, &entry.agent, &commands);
            }
            self.world.apply_commands(id, &commands);
            self.commit_damage();
        }
        let effects = self.damage.take_effects();
        if !effects.is_empty() {
            self.world.render_effects(&effects);
        }
        let dt = self.config.tick_interval;
        self.tick += 1;
        self.time += dt;
        self.world.advance(self.time, dt);
    }

    fn think(
        &mut self,
        id: EntityId,
        sounds: &[npc_schedule_core::SoundEvent],
    ) -> Vec<BodyCommand> {
        let mut commands = Vec::new();
        let Some(entry) = self.agents.get_mut(&id) else {
            return commands;
        };
        let squad = entry
            .agent
            .squad
            .and_then(|squad| self.squads.get_mut(squad));
        let mut ctx = Context {
            time: self.time,
            tick: self.tick,
            world: &self.world,
            sounds,
            config: &self.config,
            squad,
            damage: &mut self.damage,
            commands: &mut commands,
            rng: &mut self.rng,
        };
        run_ai(&mut entry.agent, entry.behavior, &mut ctx);
        commands
    }

    /// Commits the damage collected during the last think, each event exactly once.
    fn commit_damage(&mut self) {
        for mut event in self.damage.take_events() {
            let victim = event.victim();
            let (outcome, health) = if let Some(entry) = self.agents.get_mut(&victim) {
                let outcome = event.commit(&mut entry.agent, &self.config.damage);
                (outcome, entry.agent.health)
            } else if let Some(target) = self.world.damageable(victim) {
                let outcome = event.commit(target, &self.config.damage);
                (outcome, target.health())
            } else {
                log::warn!("Dropping damage to {victim}, not damageable");
                continue;
            };
            log::debug!("{} {event}: {outcome:?}", highlight_tick(self.tick));
            if matches!(
                outcome,
                DamageOutcome::Hurt { .. } | DamageOutcome::Killed { .. }
            ) {
                self.world.on_damage(victim, outcome, health);
            }
            if outcome.is_kill() {
                if let Some(entry) = self.agents.get_mut(&victim) {
                    if let Some(squad) = entry.agent.squad.take() {
                        self.squads.leave(squad, victim);
                    }
                }
            }
            self.executor_state
                .post_damage_hook(self.tick, &event, outcome);
        }
    }
}
