/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

//! A skirmish around an outpost: squads of grunts, soldiers with rifles and grenades,
//! against packs of hounds biting what they reach.
//!
//! A [Config] describes the map, the agents and the engine parameters; a [Battle] builds
//! the corresponding [OpenWorld](npc_schedule_utils::OpenWorld) and runs it, collecting
//! a [Report] through the executor hooks.

mod battle;
mod behaviors;
mod config;
mod error;
mod report;

pub use battle::*;
pub use behaviors::*;
pub use config::*;
pub use error::*;
pub use report::*;
