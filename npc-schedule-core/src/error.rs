/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use thiserror::Error;

use crate::MonsterState;

/// Configuration and persistence errors of the engine.
///
/// Runtime failures (no route, lost enemy, ...) are not errors: they are conditions
/// or task failures handled by the schedules themselves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown schedule: {0}")]
    UnknownSchedule(String),

    #[error("Schedule name registered twice with different bodies: {0}")]
    DuplicateSchedule(&'static str),

    #[error("No unconditional fallback schedule for state {0:?}")]
    MissingFallback(MonsterState),
}

pub type Result<T> = std::result::Result<T, EngineError>;
