/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The set of facts an agent holds true in a given tick.
    ///
    /// A fresh set is computed once per tick, before schedule selection.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Conditions: u64 {
        const SEE_HATE = 1 << 0;
        const SEE_FEAR = 1 << 1;
        const SEE_DISLIKE = 1 << 2;
        const SEE_NEMESIS = 1 << 3;
        const SEE_ENEMY = 1 << 4;
        const SEE_CLIENT = 1 << 5;
        const ENEMY_OCCLUDED = 1 << 6;
        const ENEMY_TOO_FAR = 1 << 7;
        const ENEMY_FACING_ME = 1 << 8;
        const NEW_ENEMY = 1 << 9;
        const ENEMY_DEAD = 1 << 10;
        const LOST_ENEMY = 1 << 11;
        const LIGHT_DAMAGE = 1 << 12;
        const HEAVY_DAMAGE = 1 << 13;
        const CAN_RANGE_ATTACK1 = 1 << 14;
        const CAN_RANGE_ATTACK2 = 1 << 15;
        const CAN_MELEE_ATTACK1 = 1 << 16;
        const CAN_MELEE_ATTACK2 = 1 << 17;
        const NO_AMMO_LOADED = 1 << 18;
        const HEAR_SOUND = 1 << 19;
        const HEAR_COMBAT = 1 << 20;
        const HEAR_WORLD = 1 << 21;
        const HEAR_PLAYER = 1 << 22;
        const HEAR_DANGER = 1 << 23;
    }
}

impl Conditions {
    /// Any kind of damage taken since the last schedule selection.
    pub const DAMAGE: Self = Self::LIGHT_DAMAGE.union(Self::HEAVY_DAMAGE);
    /// Any attack being possible right now.
    pub const CAN_ATTACK: Self = Self::CAN_RANGE_ATTACK1
        .union(Self::CAN_RANGE_ATTACK2)
        .union(Self::CAN_MELEE_ATTACK1)
        .union(Self::CAN_MELEE_ATTACK2);
    /// The bits the sensing layer derives from sounds.
    pub const HEARING: Self = Self::HEAR_SOUND
        .union(Self::HEAR_COMBAT)
        .union(Self::HEAR_WORLD)
        .union(Self::HEAR_PLAYER)
        .union(Self::HEAR_DANGER);
}

bitflags! {
    /// Longer-lived facts an agent remembers across schedules.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Memory: u16 {
        const IN_COVER = 1 << 0;
        const SUSPICIOUS = 1 << 1;
        const FLINCHED = 1 << 2;
        const PROVOKED = 1 << 3;
        const MOVE_FAILED = 1 << 4;
        const KILLED = 1 << 5;
    }
}
