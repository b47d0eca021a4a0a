/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

//! The base library of schedules shared by all behaviors, and the selection rules using them.

use crate::{
    Activity, AttackKind, Conditions as C, FaceGoal, Memory, MonsterState as S, Movement,
    PathGoal, Schedule, ScheduleRule as Rule, SoundClass, SquadSlots, Task,
};

const SEE_HOSTILE: C = C::SEE_ENEMY
    .union(C::SEE_HATE)
    .union(C::SEE_DISLIKE)
    .union(C::SEE_NEMESIS);

const LOSE_TARGET: C = C::NEW_ENEMY.union(C::ENEMY_DEAD).union(C::LOST_ENEMY);

pub static IDLE_STAND: Schedule = Schedule::new(
    "idle-stand",
    &[
        Task::StopMoving,
        Task::Forget(Memory::SUSPICIOUS.union(Memory::FLINCHED)),
        Task::SetActivity(Activity::Idle),
        Task::WaitRandom(5.),
    ],
)
.interrupted_by(
    C::NEW_ENEMY
        .union(SEE_HOSTILE)
        .union(C::SEE_FEAR)
        .union(C::DAMAGE)
        .union(C::HEAR_SOUND),
)
.hearing(SoundClass::all());

pub static ALERT_STAND: Schedule = Schedule::new(
    "alert-stand",
    &[
        Task::StopMoving,
        Task::SetActivity(Activity::Idle),
        Task::Wait(10.),
        Task::SuggestState(S::Idle),
    ],
)
.interrupted_by(
    C::NEW_ENEMY
        .union(SEE_HOSTILE)
        .union(C::SEE_FEAR)
        .union(C::DAMAGE)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER);

pub static ALERT_SMALL_FLINCH: Schedule = Schedule::new(
    "alert-small-flinch",
    &[
        Task::StopMoving,
        Task::Remember(Memory::FLINCHED),
        Task::PlayActivity(Activity::SmallFlinch),
    ],
);

pub static INVESTIGATE_SOUND: Schedule = Schedule::new(
    "investigate-sound",
    &[
        Task::StopMoving,
        Task::Remember(Memory::SUSPICIOUS),
        Task::Face(FaceGoal::BestSound),
        Task::GetPathTo(PathGoal::BestSound),
        Task::SetMovement(Movement::Walk),
        Task::WaitForMovement,
        Task::Face(FaceGoal::BestSound),
        Task::Wait(3.),
    ],
)
.interrupted_by(
    C::NEW_ENEMY
        .union(SEE_HOSTILE)
        .union(C::SEE_FEAR)
        .union(C::DAMAGE)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER)
.failing_to("alert-stand");

pub static COMBAT_FACE: Schedule = Schedule::new(
    "combat-face",
    &[
        Task::StopMoving,
        Task::Forget(Memory::FLINCHED),
        Task::SetActivity(Activity::CombatIdle),
        Task::Face(FaceGoal::Enemy),
        Task::WaitFaceEnemy(1.),
    ],
)
.interrupted_by(
    C::CAN_ATTACK
        .union(LOSE_TARGET)
        .union(C::DAMAGE)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER);

pub static STANDOFF: Schedule = Schedule::new(
    "standoff",
    &[
        Task::StopMoving,
        Task::SetActivity(Activity::CombatIdle),
        Task::WaitFaceEnemy(2.),
        Task::Forget(Memory::MOVE_FAILED),
    ],
)
.interrupted_by(LOSE_TARGET.union(C::DAMAGE).union(C::HEAR_DANGER))
.hearing(SoundClass::DANGER);

const ATTACK_INTERRUPTS: C = LOSE_TARGET
    .union(C::HEAVY_DAMAGE)
    .union(C::ENEMY_OCCLUDED)
    .union(C::HEAR_DANGER);

pub static RANGE_ATTACK1: Schedule = Schedule::new(
    "range-attack1",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Attack(AttackKind::RangePrimary),
    ],
)
.interrupted_by(ATTACK_INTERRUPTS.union(C::NO_AMMO_LOADED))
.hearing(SoundClass::DANGER);

pub static RANGE_ATTACK2: Schedule = Schedule::new(
    "range-attack2",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Attack(AttackKind::RangeSecondary),
    ],
)
.interrupted_by(ATTACK_INTERRUPTS)
.hearing(SoundClass::DANGER);

pub static MELEE_ATTACK1: Schedule = Schedule::new(
    "melee-attack1",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Attack(AttackKind::MeleePrimary),
    ],
)
.interrupted_by(ATTACK_INTERRUPTS);

pub static MELEE_ATTACK2: Schedule = Schedule::new(
    "melee-attack2",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Attack(AttackKind::MeleeSecondary),
    ],
)
.interrupted_by(ATTACK_INTERRUPTS);

pub static CHASE_ENEMY: Schedule = Schedule::new(
    "chase-enemy",
    &[
        Task::GetPathTo(PathGoal::Enemy),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
    ],
)
.interrupted_by(
    C::CAN_ATTACK
        .union(LOSE_TARGET)
        .union(C::DAMAGE)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER)
.failing_to("chase-enemy-failed");

pub static CHASE_ENEMY_FAILED: Schedule = Schedule::new(
    "chase-enemy-failed",
    &[
        Task::StopMoving,
        Task::Remember(Memory::MOVE_FAILED),
        Task::WaitFaceEnemy(0.5),
        Task::GetPathTo(PathGoal::CoverFromEnemy(512.)),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
        Task::Remember(Memory::IN_COVER),
        Task::WaitFaceEnemy(1.),
    ],
)
.interrupted_by(C::CAN_ATTACK.union(LOSE_TARGET).union(C::DAMAGE))
.recovery();

pub static SMALL_FLINCH: Schedule = Schedule::new(
    "small-flinch",
    &[
        Task::StopMoving,
        Task::Remember(Memory::FLINCHED),
        Task::PlayActivity(Activity::SmallFlinch),
    ],
);

pub static TAKE_COVER_FROM_ENEMY: Schedule = Schedule::new(
    "take-cover-from-enemy",
    &[
        Task::StopMoving,
        Task::Wait(0.2),
        Task::GetPathTo(PathGoal::CoverFromEnemy(768.)),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
        Task::Remember(Memory::IN_COVER),
        Task::Face(FaceGoal::Enemy),
        Task::Wait(1.),
    ],
)
.interrupted_by(C::NEW_ENEMY);

pub static TAKE_COVER_FROM_BEST_SOUND: Schedule = Schedule::new(
    "take-cover-from-best-sound",
    &[
        Task::StopMoving,
        Task::GetPathTo(PathGoal::CoverFromBestSound(512.)),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
        Task::Remember(Memory::IN_COVER),
        Task::Face(FaceGoal::BestSound),
        Task::Wait(1.),
    ],
)
.interrupted_by(C::NEW_ENEMY);

pub static RELOAD: Schedule = Schedule::new("reload", &[Task::StopMoving, Task::Reload])
    .interrupted_by(C::HEAVY_DAMAGE.union(C::HEAR_DANGER))
    .hearing(SoundClass::DANGER);

pub static VICTORY_DANCE: Schedule = Schedule::new(
    "victory-dance",
    &[
        Task::StopMoving,
        Task::PlayActivity(Activity::VictoryDance),
        Task::SuggestState(S::Alert),
    ],
)
.interrupted_by(C::NEW_ENEMY.union(C::DAMAGE));

pub static HUNT: Schedule = Schedule::new(
    "hunt",
    &[
        Task::StopMoving,
        Task::GetPathTo(PathGoal::EnemyLastKnown),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
        Task::Remember(Memory::SUSPICIOUS),
        Task::WaitRandom(2.),
    ],
)
.interrupted_by(
    C::NEW_ENEMY
        .union(SEE_HOSTILE)
        .union(C::DAMAGE)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER)
.failing_to("alert-stand");

pub static PRONE_WAIT: Schedule =
    Schedule::new("prone-wait", &[Task::StopMoving, Task::WaitIndefinite]);

pub static SCRIPTED_WAIT: Schedule = Schedule::new(
    "scripted-wait",
    &[
        Task::StopMoving,
        Task::SetActivity(Activity::Idle),
        Task::WaitIndefinite,
    ],
);

pub static DIE: Schedule = Schedule::new(
    "die",
    &[
        Task::StopMoving,
        Task::PlayActivity(Activity::Die),
        Task::WaitIndefinite,
    ],
);

/// The default failure schedule.
pub static FAIL: Schedule = Schedule::new(
    "fail",
    &[
        Task::StopMoving,
        Task::SetActivity(Activity::Idle),
        Task::Wait(1.),
    ],
)
.interrupted_by(C::NEW_ENEMY)
.recovery();

/// All schedules of the base library.
pub static BASE_SCHEDULES: &[&Schedule] = &[
    &IDLE_STAND,
    &ALERT_STAND,
    &ALERT_SMALL_FLINCH,
    &INVESTIGATE_SOUND,
    &COMBAT_FACE,
    &STANDOFF,
    &RANGE_ATTACK1,
    &RANGE_ATTACK2,
    &MELEE_ATTACK1,
    &MELEE_ATTACK2,
    &CHASE_ENEMY,
    &CHASE_ENEMY_FAILED,
    &SMALL_FLINCH,
    &TAKE_COVER_FROM_ENEMY,
    &TAKE_COVER_FROM_BEST_SOUND,
    &RELOAD,
    &VICTORY_DANCE,
    &HUNT,
    &PRONE_WAIT,
    &SCRIPTED_WAIT,
    &DIE,
    &FAIL,
];

/// The selection rules of the base library, in priority order within each state.
///
/// The last rule of each state is unconditional.
pub static BASE_RULES: &[Rule] = &[
    // idle
    Rule::new(S::Idle, &IDLE_STAND),
    // alert
    Rule::new(S::Alert, &VICTORY_DANCE).requires(C::ENEMY_DEAD),
    Rule::new(S::Alert, &ALERT_SMALL_FLINCH)
        .requires(C::LIGHT_DAMAGE)
        .forbids_memory(Memory::FLINCHED),
    Rule::new(S::Alert, &TAKE_COVER_FROM_BEST_SOUND).requires(C::HEAR_DANGER),
    Rule::new(S::Alert, &INVESTIGATE_SOUND)
        .requires(C::HEAR_SOUND)
        .forbids_memory(Memory::SUSPICIOUS),
    Rule::new(S::Alert, &ALERT_STAND),
    // combat
    Rule::new(S::Combat, &VICTORY_DANCE)
        .requires(C::ENEMY_DEAD)
        .forbids(C::SEE_ENEMY),
    Rule::new(S::Combat, &SMALL_FLINCH)
        .requires(C::HEAVY_DAMAGE)
        .forbids_memory(Memory::FLINCHED),
    Rule::new(S::Combat, &TAKE_COVER_FROM_BEST_SOUND).requires(C::HEAR_DANGER),
    Rule::new(S::Combat, &RELOAD)
        .requires(C::NO_AMMO_LOADED)
        .forbids(C::CAN_MELEE_ATTACK1),
    Rule::new(S::Combat, &MELEE_ATTACK1).requires(C::CAN_MELEE_ATTACK1),
    Rule::new(S::Combat, &MELEE_ATTACK2).requires(C::CAN_MELEE_ATTACK2),
    Rule::new(S::Combat, &RANGE_ATTACK2)
        .requires(C::CAN_RANGE_ATTACK2)
        .claims_slot(SquadSlots::GRENADE),
    Rule::new(S::Combat, &RANGE_ATTACK1)
        .requires(C::CAN_RANGE_ATTACK1)
        .claims_slot(SquadSlots::ATTACK),
    Rule::new(S::Combat, &TAKE_COVER_FROM_ENEMY)
        .requires(C::CAN_RANGE_ATTACK1.union(C::LIGHT_DAMAGE))
        .forbids_memory(Memory::IN_COVER),
    Rule::new(S::Combat, &STANDOFF).requires(C::CAN_RANGE_ATTACK1),
    Rule::new(S::Combat, &CHASE_ENEMY)
        .requires(C::SEE_ENEMY)
        .forbids_memory(Memory::MOVE_FAILED)
        .claims_slot(SquadSlots::CHASE),
    Rule::new(S::Combat, &STANDOFF).requires(C::SEE_ENEMY),
    Rule::new(S::Combat, &COMBAT_FACE),
    // hunt
    Rule::new(S::Hunt, &TAKE_COVER_FROM_BEST_SOUND).requires(C::HEAR_DANGER),
    Rule::new(S::Hunt, &HUNT),
    // externally driven states
    Rule::new(S::Prone, &PRONE_WAIT),
    Rule::new(S::Scripted, &SCRIPTED_WAIT),
    Rule::new(S::Dead, &DIE),
];
