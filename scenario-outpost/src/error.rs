/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use thiserror::Error;

/// Errors raised while loading or setting up a scenario.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid scenario description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown behavior: {0}")]
    UnknownBehavior(String),

    #[error("Invalid override \"{0}\", should be \"some.path=value\"")]
    InvalidOverride(String),

    #[error(transparent)]
    Engine(#[from] npc_schedule_core::EngineError),
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
