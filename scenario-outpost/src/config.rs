/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::{fs, io};

use glam::Vec3;
use npc_schedule_core::{Classification, EngineConfig};
use npc_schedule_utils::{Aabb, OpenWorldConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, ScenarioError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BatchConfig {
    #[serde(default)]
    pub runs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig { runs: 1 }
    }
}

/// The static geometry of the outpost.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MapConfig {
    pub walls: Vec<Aabb>,
    pub water: Vec<Aabb>,
    pub cover_points: Vec<Vec3>,
}

/// An agent to spawn.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpawnConfig {
    /// name of the behavior, `grunt` or `hound`
    pub behavior: String,
    pub position: Vec3,
    #[serde(default)]
    pub facing: Option<Vec3>,
    /// agents sharing a squad name are formed into one squad, in order of appearance
    #[serde(default)]
    pub squad: Option<String>,
}

/// A passive body agents may fight over, for instance the player.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    pub position: Vec3,
    #[serde(default = "target_classification_default")]
    pub classification: Classification,
    #[serde(default = "target_health_default")]
    pub health: f32,
}

fn target_classification_default() -> Classification {
    Classification::Player
}

fn target_health_default() -> f32 {
    100.
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// maximum duration of a run, in ticks
    #[serde(default = "ticks_default")]
    pub ticks: u64,
    #[serde(default = "Default::default")]
    pub batch: BatchConfig,
    #[serde(default = "Default::default")]
    pub engine: EngineConfig,
    #[serde(default = "Default::default")]
    pub world: OpenWorldConfig,
    #[serde(default = "Default::default")]
    pub map: MapConfig,
    pub agents: Vec<SpawnConfig>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

fn ticks_default() -> u64 {
    600
}

impl Config {
    pub fn from_json(json: Value) -> Result<Self> {
        Ok(serde_json::from_value(json)?)
    }

    /// Reads a configuration from `path` (`-` for the standard input), then applies
    /// the `some.path=value` overrides in order.
    pub fn load<'a>(path: &str, overrides: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut json: Value = match path {
            "-" => {
                let stdin = io::stdin();
                serde_json::from_reader(stdin.lock())?
            }
            path => {
                let file = fs::OpenOptions::new()
                    .read(true)
                    .open(path)
                    .map_err(|source| ScenarioError::Io {
                        path: path.to_owned(),
                        source,
                    })?;
                serde_json::from_reader(io::BufReader::new(file))?
            }
        };
        for assignment in overrides {
            apply_override(&mut json, assignment)?;
        }
        Self::from_json(json)
    }
}

/// Sets the value at a dotted path of a JSON configuration, creating intermediate objects.
///
/// `assignment` has the form `some.path=value`, where `value` is JSON.
pub fn apply_override(json: &mut Value, assignment: &str) -> Result<()> {
    let invalid = || ScenarioError::InvalidOverride(assignment.to_owned());
    let (path, value) = assignment.split_once('=').ok_or_else(invalid)?;
    let value: Value = serde_json::from_str(value)?;

    let mut object = json;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        if key.is_empty() {
            return Err(invalid());
        }
        let map = object.as_object_mut().ok_or_else(invalid)?;
        if keys.peek().is_none() {
            map.insert(key.to_owned(), value);
            return Ok(());
        }
        // Key is not present or not an object
        let entry = map
            .entry(key.to_owned())
            .or_insert_with(|| Value::Object(Default::default()));
        if !entry.is_object() {
            *entry = Value::Object(Default::default());
        }
        object = entry;
    }
    Err(invalid())
}
