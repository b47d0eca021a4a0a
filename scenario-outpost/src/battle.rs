/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::collections::BTreeMap;

use npc_schedule_core::{Agent, Classification, EntityId, MonsterBehavior};
use npc_schedule_utils::{Body, OpenWorld, SimpleExecutor};

use crate::{Archetype, Config, Report, Result, TARGET_SIDE};

/// A world populated from a configuration, ready to be simulated.
pub struct Battle {
    pub world: OpenWorld,
    recruits: Vec<(Agent, &'static dyn MonsterBehavior)>,
    squads: BTreeMap<String, Vec<EntityId>>,
    report: Report,
}

impl Battle {
    /// Builds the world of run number `run`.
    ///
    /// If the configuration has a seed, the run uses that seed offset by its number,
    /// so that the runs of a batch differ but are reproducible.
    pub fn new(config: &Config, run: usize) -> Result<Self> {
        let seed = config.engine.seed.map(|seed| seed.wrapping_add(run as u64));
        let mut world = OpenWorld::new(config.world.clone());
        for wall in &config.map.walls {
            world.add_wall(*wall);
        }
        for volume in &config.map.water {
            world.add_water(*volume);
        }
        for point in &config.map.cover_points {
            world.add_cover_point(*point);
        }

        let mut report = Report::new(run, seed);
        let mut recruits = Vec::with_capacity(config.agents.len());
        let mut squads: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for spawn in &config.agents {
            let archetype = Archetype::named(&spawn.behavior)?;
            let mut body = Body::new(archetype.classification, spawn.position, archetype.health);
            if let Some(facing) = spawn.facing {
                body = body.facing(facing);
            }
            let id = world.spawn(body);
            report.enlist(id, archetype.behavior.name());
            recruits.push((archetype.agent(id), archetype.behavior));
            if let Some(squad) = &spawn.squad {
                squads.entry(squad.clone()).or_default().push(id);
            }
        }
        for target in &config.targets {
            let mut body = Body::new(target.classification, target.position, target.health);
            if target.classification == Classification::Player {
                body = body.client();
            }
            let id = world.spawn(body);
            report.enlist(id, TARGET_SIDE);
        }

        Ok(Self {
            world,
            recruits,
            squads,
            report,
        })
    }

    /// Runs the battle until a single side stands or `ticks` ticks elapsed.
    pub fn run(self, config: &Config, ticks: u64) -> Report {
        let Battle {
            world,
            recruits,
            squads,
            mut report,
        } = self;
        let mut engine = config.engine.clone();
        engine.seed = report.seed;

        let elapsed = {
            let mut executor = SimpleExecutor::new(engine, world, &mut report);
            for (agent, behavior) in recruits {
                executor.add_agent(agent, behavior);
            }
            for (name, members) in &squads {
                match executor.form_squad(members) {
                    Some(id) => log::debug!("squad {name} formed as {id}"),
                    None => log::warn!("squad {name} could not be formed"),
                }
            }
            while executor.tick() < ticks {
                executor.step();
                if executor.state().is_decided() {
                    break;
                }
            }
            executor.tick()
        };
        report.finish(elapsed);
        log::info!(
            "run {} ended after {} ticks, winner: {}",
            report.run,
            report.ticks,
            report.winner.as_deref().unwrap_or("none")
        );
        report
    }
}

/// Builds and runs run number `run` of `config`.
pub fn simulate(config: &Config, run: usize) -> Result<Report> {
    Ok(Battle::new(config, run)?.run(config, config.ticks))
}
