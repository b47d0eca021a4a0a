/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use lazy_static::lazy_static;
use npc_schedule_core::{Agent, Classification, EntityId, MonsterBehavior};

use crate::{Result, ScenarioError};

mod grunt;
mod hound;

pub use grunt::*;
pub use hound::*;

lazy_static! {
    pub static ref GRUNT: Grunt = Grunt::new();
    pub static ref HOUND: Hound = Hound::new();
}

/// What it takes to spawn an agent of a given behavior.
#[derive(Clone, Copy)]
pub struct Archetype {
    pub behavior: &'static dyn MonsterBehavior,
    pub classification: Classification,
    pub health: f32,
    /// size of the clip of its weapon, if it needs reloading
    pub clip: Option<u32>,
}

impl Archetype {
    /// Looks up an archetype by behavior name.
    pub fn named(name: &str) -> Result<Self> {
        match name {
            "grunt" => Ok(Self {
                behavior: &*GRUNT,
                classification: Grunt::CLASSIFICATION,
                health: Grunt::HEALTH,
                clip: Some(Grunt::CLIP_SIZE),
            }),
            "hound" => Ok(Self {
                behavior: &*HOUND,
                classification: Hound::CLASSIFICATION,
                health: Hound::HEALTH,
                clip: None,
            }),
            _ => Err(ScenarioError::UnknownBehavior(name.to_owned())),
        }
    }

    /// Creates the agent driving the body `id`.
    pub fn agent(&self, id: EntityId) -> Agent {
        let agent = Agent::new(id, self.classification, self.health);
        match self.clip {
            Some(size) => agent.with_clip(size),
            None => agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn archetypes_by_name() {
        let grunt = Archetype::named("grunt").unwrap();
        assert_eq!(grunt.behavior.name(), "grunt");
        let agent = grunt.agent(npc_schedule_core::EntityId::new(2, 0));
        assert_eq!(agent.clip.map(|clip| clip.max), Some(Grunt::CLIP_SIZE));
        assert!(Archetype::named("hound").unwrap().agent(agent.id).clip.is_none());
        assert!(matches!(
            Archetype::named("vortigaunt"),
            Err(ScenarioError::UnknownBehavior(name)) if name == "vortigaunt"
        ));
    }
}
