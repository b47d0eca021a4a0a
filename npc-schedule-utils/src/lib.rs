/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

//! This is the utility module of the NPC schedule engine, containing helpful utility code.
//!
//! It contains the following features:
//! - An executor (update loop), [SimpleExecutor], that drives all agents of an [ExecutorWorld]:
//!   it runs their thinks, applies their body commands and commits their damage, and related abstractions.
//! - [OpenWorld], a simple reference world of bodies, box walls, water volumes and cover points,
//!   with straight-line locomotion, used by tests and demos.
//! - Axis-aligned boxes ([Aabb]) with segment intersection.

mod aabb;
mod executor;
mod open_world;

pub use aabb::*;
pub use executor::*;
pub use open_world::*;
