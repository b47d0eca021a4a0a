/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use crate::{Activity, Memory, MonsterState, Movement};

/// What a facing task turns towards.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum FaceGoal {
    /// last known position of the enemy
    Enemy,
    BestSound,
}

/// What a path task computes a route towards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathGoal {
    /// the enemy's current position, requires it to be visible
    Enemy,
    EnemyLastKnown,
    BestSound,
    /// a position hidden from the enemy, within the given distance
    CoverFromEnemy(f32),
    /// a position hidden from the best heard sound, within the given distance
    CoverFromBestSound(f32),
}

/// The attack callbacks a behavior may provide.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum AttackKind {
    RangePrimary,
    RangeSecondary,
    MeleePrimary,
    MeleeSecondary,
    Special,
}
impl AttackKind {
    pub fn activity(self) -> Activity {
        match self {
            AttackKind::RangePrimary | AttackKind::Special => Activity::RangeAttack1,
            AttackKind::RangeSecondary => Activity::RangeAttack2,
            AttackKind::MeleePrimary => Activity::MeleeAttack1,
            AttackKind::MeleeSecondary => Activity::MeleeAttack2,
        }
    }
}

/// One step of a schedule, drawn from a closed vocabulary.
///
/// Tasks are stateless descriptors; the progress of the running task lives in the agent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Task {
    StopMoving,
    SetActivity(Activity),
    /// plays an activity and completes once it played through
    PlayActivity(Activity),
    Face(FaceGoal),
    Wait(f32),
    /// waits for a random duration up to the parameter
    WaitRandom(f32),
    WaitFaceEnemy(f32),
    /// never completes, only an interrupt ends it
    WaitIndefinite,
    GetPathTo(PathGoal),
    SetMovement(Movement),
    WaitForMovement,
    Attack(AttackKind),
    Reload,
    Speak(&'static str),
    /// speaks only once per rediscovery of the enemy
    AlertReaction(&'static str),
    SuggestState(MonsterState),
    /// overrides the failure schedule of the current schedule run
    SetFailSchedule(&'static str),
    Remember(Memory),
    Forget(Memory),
    /// dispatched to the behavior, with an id and a parameter
    Custom(u16, f32),
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::StopMoving => write!(f, "StopMoving"),
            Task::SetActivity(activity) => write!(f, "SetActivity({activity:?})"),
            Task::PlayActivity(activity) => write!(f, "PlayActivity({activity:?})"),
            Task::Face(goal) => write!(f, "Face({goal:?})"),
            Task::Wait(duration) => write!(f, "Wait({duration})"),
            Task::WaitRandom(duration) => write!(f, "WaitRandom({duration})"),
            Task::WaitFaceEnemy(duration) => write!(f, "WaitFaceEnemy({duration})"),
            Task::WaitIndefinite => write!(f, "WaitIndefinite"),
            Task::GetPathTo(goal) => write!(f, "GetPathTo({goal:?})"),
            Task::SetMovement(movement) => write!(f, "SetMovement({movement:?})"),
            Task::WaitForMovement => write!(f, "WaitForMovement"),
            Task::Attack(kind) => write!(f, "Attack({kind:?})"),
            Task::Reload => write!(f, "Reload"),
            Task::Speak(line) => write!(f, "Speak({line})"),
            Task::AlertReaction(line) => write!(f, "AlertReaction({line})"),
            Task::SuggestState(state) => write!(f, "SuggestState({state:?})"),
            Task::SetFailSchedule(name) => write!(f, "SetFailSchedule({name})"),
            Task::Remember(memory) => write!(f, "Remember({memory:?})"),
            Task::Forget(memory) => write!(f, "Forget({memory:?})"),
            Task::Custom(id, param) => write!(f, "Custom({id}, {param})"),
        }
    }
}

/// The result of starting or continuing a task.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum TaskOutcome {
    Running,
    Complete,
    Failed,
}
