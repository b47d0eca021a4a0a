/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use serde::{Deserialize, Serialize};

/// The faction-like class of an entity, used to derive relationships.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    None,
    Machine,
    Player,
    HumanPassive,
    HumanMilitary,
    AlienMilitary,
    AlienPassive,
    AlienMonster,
    AlienPrey,
    AlienPredator,
    Insect,
    PlayerAlly,
}

impl Classification {
    fn row(self) -> usize {
        self as usize
    }
}

/// How an entity feels about another, ordered by enemy priority.
///
/// Only `Dislike`, `Hate` and `Nemesis` make an entity eligible as an enemy.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    Ally,
    Fear,
    None,
    Dislike,
    Hate,
    Nemesis,
}

impl Relationship {
    pub fn is_hostile(self) -> bool {
        self >= Relationship::Dislike
    }
}

use Relationship::{Ally as AL, Dislike as DL, Fear as FR, Hate as HT, None as NO};

#[rustfmt::skip]
const RELATIONSHIPS: [[Relationship; 12]; 12] = [
    //  none machine player hpass hmil amil apass amon aprey apred insect pally
    [NO, NO, NO, NO, NO, NO, NO, NO, NO, NO, NO, NO], // none
    [NO, NO, DL, DL, NO, DL, DL, DL, DL, DL, NO, DL], // machine
    [NO, DL, NO, NO, DL, DL, DL, DL, DL, DL, NO, NO], // player
    [NO, NO, AL, AL, HT, FR, NO, HT, DL, FR, NO, AL], // human passive
    [NO, NO, HT, DL, NO, HT, DL, DL, DL, DL, NO, HT], // human military
    [NO, DL, HT, DL, HT, NO, NO, NO, NO, NO, NO, DL], // alien military
    [NO, NO, NO, NO, NO, NO, NO, NO, NO, NO, NO, NO], // alien passive
    [NO, DL, DL, DL, DL, NO, NO, NO, NO, NO, NO, DL], // alien monster
    [NO, NO, DL, DL, DL, NO, NO, NO, NO, FR, NO, DL], // alien prey
    [NO, NO, DL, DL, DL, NO, NO, NO, HT, DL, NO, DL], // alien predator
    [FR, FR, FR, FR, FR, NO, FR, FR, FR, FR, NO, FR], // insect
    [NO, DL, AL, AL, DL, DL, DL, DL, DL, DL, NO, NO], // player ally
];

/// The default relationship of an entity of class `me` towards one of class `other`.
pub fn default_relationship(me: Classification, other: Classification) -> Relationship {
    RELATIONSHIPS[me.row()][other.row()]
}
