/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use npc_schedule_core::{
    default_relationship, Activity, Agent, AttackKind, BodyCommand, Classification, CombatConfig,
    Conditions as C, Context, DamageFlags, FaceGoal, Memory, MonsterBehavior, MonsterState as S,
    Movement, PathGoal, Relationship, Schedule, ScheduleRepository, ScheduleRule as Rule,
    SoundClass, Task, TaskOutcome, MELEE_ATTACK1,
};

/// Custom task: howls to rally the pack, the parameter is the radius of the howl.
pub const HOWL_TASK: u16 = 1;

pub static HOUND_HOWL: Schedule = Schedule::new(
    "hound-howl",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::AlertReaction("HOUND_HOWL"),
        Task::Custom(HOWL_TASK, 768.),
        Task::PlayActivity(Activity::Signal),
    ],
)
.interrupted_by(C::ENEMY_DEAD.union(C::DAMAGE).union(C::CAN_MELEE_ATTACK1));

pub static HOUND_CHARGE: Schedule = Schedule::new(
    "hound-charge",
    &[
        Task::GetPathTo(PathGoal::Enemy),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
    ],
)
.interrupted_by(
    C::CAN_MELEE_ATTACK1
        .union(C::NEW_ENEMY)
        .union(C::ENEMY_DEAD)
        .union(C::LOST_ENEMY)
        .union(C::ENEMY_OCCLUDED)
        .union(C::HEAVY_DAMAGE),
)
.failing_to("chase-enemy-failed");

/// Rules taking precedence over the base library for hounds.
///
/// Contrary to soldiers, the whole pack charges at once, without squad slots.
pub static HOUND_RULES: &[Rule] = &[
    Rule::new(S::Combat, &MELEE_ATTACK1).requires(C::CAN_MELEE_ATTACK1),
    Rule::new(S::Combat, &HOUND_HOWL).requires(C::NEW_ENEMY.union(C::SEE_ENEMY)),
    Rule::new(S::Combat, &HOUND_CHARGE)
        .requires(C::SEE_ENEMY)
        .forbids_memory(Memory::MOVE_FAILED),
];

/// A beast hunting in packs, biting what it reaches.
pub struct Hound {
    repository: ScheduleRepository,
}

impl Hound {
    pub const CLASSIFICATION: Classification = Classification::AlienMonster;
    pub const HEALTH: f32 = 40.;
    pub const BITE_RANGE: f32 = 64.;
    pub const BITE_DAMAGE: f32 = 10.;

    pub fn new() -> Self {
        let mut repository = ScheduleRepository::base();
        if let Err(error) = repository.prepend_rules(HOUND_RULES) {
            log::error!("hound schedules rejected: {error}");
        }
        Self { repository }
    }
}

impl Default for Hound {
    fn default() -> Self {
        Self::new()
    }
}

impl MonsterBehavior for Hound {
    fn name(&self) -> &'static str {
        "hound"
    }

    fn repository(&self) -> &ScheduleRepository {
        &self.repository
    }

    fn relationship(&self, me: Classification, other: Classification) -> Relationship {
        match other {
            Classification::HumanMilitary | Classification::Player => Relationship::Hate,
            _ => default_relationship(me, other),
        }
    }

    fn check_melee_attack1(
        &self,
        _agent: &Agent,
        dot: f32,
        distance: f32,
        config: &CombatConfig,
    ) -> bool {
        distance <= Self::BITE_RANGE && dot >= config.melee_cone
    }

    fn check_range_attack1(&self, _: &Agent, _: f32, _: f32, _: &CombatConfig) -> bool {
        false
    }

    fn attack(&self, kind: AttackKind, agent: &mut Agent, ctx: &mut Context) -> TaskOutcome {
        if kind != AttackKind::MeleePrimary {
            return TaskOutcome::Failed;
        }
        match ctx.melee_strike(agent, Self::BITE_RANGE, Self::BITE_DAMAGE, DamageFlags::SLASH) {
            Some(victim) => log::trace!("{}: bites {victim}", agent.id),
            None => log::trace!("{}: bites the air", agent.id),
        }
        TaskOutcome::Running
    }

    fn start_custom_task(
        &self,
        id: u16,
        param: f32,
        agent: &mut Agent,
        ctx: &mut Context,
    ) -> TaskOutcome {
        match id {
            HOWL_TASK => {
                log::debug!("{}: howls", agent.id);
                ctx.command(BodyCommand::EmitSound {
                    class: SoundClass::COMBAT,
                    radius: param,
                    duration: 1.,
                });
                TaskOutcome::Complete
            }
            _ => {
                log::warn!("{}: unknown custom task {id}", self.name());
                TaskOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use npc_schedule_core::*;

    #[test]
    fn repository_is_valid() {
        assert_eq!(HOUND.repository().validate(), Ok(()));
    }

    #[test]
    fn hunts_soldiers() {
        assert_eq!(
            HOUND.relationship(Hound::CLASSIFICATION, Classification::HumanMilitary),
            Relationship::Hate
        );
        assert_eq!(
            HOUND.relationship(Hound::CLASSIFICATION, Classification::AlienMonster),
            Relationship::None
        );
    }

    #[test]
    fn bites_before_charging() {
        let mut agent = Agent::new(EntityId::new(0, 0), Hound::CLASSIFICATION, Hound::HEALTH)
            .with_state(MonsterState::Combat);
        agent.conditions = Conditions::SEE_ENEMY | Conditions::CAN_MELEE_ATTACK1;
        let schedule = HOUND.repository().select_schedule(&mut agent, None);
        assert_eq!(schedule.name, "melee-attack1");

        agent.conditions = Conditions::SEE_ENEMY;
        let schedule = HOUND.repository().select_schedule(&mut agent, None);
        assert_eq!(schedule.name, "hound-charge");
    }
}
