/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use npc_schedule_core::{
    Activity, Agent, AttackKind, BodyCommand, Classification, CombatConfig, Conditions as C,
    Context, DamageFlags, FaceGoal, Memory, MonsterBehavior, MonsterState as S, Movement,
    PathGoal, RadiusDamage, Schedule, ScheduleRepository, ScheduleRule as Rule, SoundClass,
    SquadSlots, Task, TaskOutcome,
};
use rand::Rng;

const LOSE_TARGET: C = C::NEW_ENEMY.union(C::ENEMY_DEAD).union(C::LOST_ENEMY);

pub static GRUNT_FOUND_ENEMY: Schedule = Schedule::new(
    "grunt-found-enemy",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::AlertReaction("GRUNT_ALERT"),
        Task::PlayActivity(Activity::Signal),
    ],
)
.interrupted_by(C::ENEMY_DEAD.union(C::LOST_ENEMY).union(C::DAMAGE));

pub static GRUNT_SUPPRESS: Schedule = Schedule::new(
    "grunt-suppress",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Attack(AttackKind::RangePrimary),
        Task::Attack(AttackKind::RangePrimary),
        Task::Attack(AttackKind::RangePrimary),
    ],
)
.interrupted_by(
    LOSE_TARGET
        .union(C::HEAVY_DAMAGE)
        .union(C::ENEMY_OCCLUDED)
        .union(C::NO_AMMO_LOADED)
        .union(C::HEAR_DANGER),
)
.hearing(SoundClass::DANGER)
.failing_to("grunt-cover-and-reload");

pub static GRUNT_GRENADE: Schedule = Schedule::new(
    "grunt-grenade",
    &[
        Task::StopMoving,
        Task::Face(FaceGoal::Enemy),
        Task::Speak("GRUNT_THROW"),
        Task::Attack(AttackKind::RangeSecondary),
        Task::Reload,
    ],
)
.interrupted_by(C::HEAVY_DAMAGE);

pub static GRUNT_COVER_AND_RELOAD: Schedule = Schedule::new(
    "grunt-cover-and-reload",
    &[
        Task::StopMoving,
        Task::Speak("GRUNT_COVER"),
        Task::SetFailSchedule("reload"),
        Task::GetPathTo(PathGoal::CoverFromEnemy(512.)),
        Task::SetMovement(Movement::Run),
        Task::WaitForMovement,
        Task::Remember(Memory::IN_COVER),
        Task::Reload,
    ],
)
.interrupted_by(C::HEAVY_DAMAGE);

/// Rules taking precedence over the base library for grunts.
pub static GRUNT_RULES: &[Rule] = &[
    Rule::new(S::Combat, &GRUNT_FOUND_ENEMY).requires(C::NEW_ENEMY.union(C::SEE_ENEMY)),
    Rule::new(S::Combat, &GRUNT_GRENADE)
        .requires(C::CAN_RANGE_ATTACK2)
        .claims_slot(SquadSlots::GRENADE1),
    Rule::new(S::Combat, &GRUNT_COVER_AND_RELOAD).requires(C::NO_AMMO_LOADED),
    Rule::new(S::Combat, &GRUNT_SUPPRESS)
        .requires(C::CAN_RANGE_ATTACK1)
        .claims_slot(SquadSlots::ATTACK),
];

/// A soldier fighting in squads, with a rifle that needs reloading and grenades.
///
/// A grunt whose clip runs dry while its enemy is at a safe distance lobs a grenade
/// before reloading; only one member of a squad may do so at a time.
pub struct Grunt {
    repository: ScheduleRepository,
}

impl Grunt {
    pub const CLASSIFICATION: Classification = Classification::HumanMilitary;
    pub const HEALTH: f32 = 50.;
    pub const CLIP_SIZE: u32 = 6;
    pub const RANGE: f32 = 1024.;
    pub const BULLET_DAMAGE: f32 = 5.;
    /// horizontal spread of bullets at the target, in world units
    pub const SPREAD: f32 = 8.;
    pub const GRENADE_DAMAGE: f32 = 60.;
    pub const GRENADE_RADIUS: f32 = 192.;
    pub const GRENADE_MIN_DISTANCE: f32 = 256.;

    pub fn new() -> Self {
        let mut repository = ScheduleRepository::base();
        if let Err(error) = repository.prepend_rules(GRUNT_RULES) {
            log::error!("grunt schedules rejected: {error}");
        }
        Self { repository }
    }

    fn fire(&self, agent: &Agent, ctx: &mut Context) -> TaskOutcome {
        let Some(target) = agent
            .enemy
            .and_then(|enemy| ctx.world.entity(enemy.handle))
            .map(|info| info.body_target())
        else {
            return TaskOutcome::Failed;
        };
        let spread = Vec3::new(
            ctx.rng.gen_range(-Self::SPREAD..=Self::SPREAD),
            ctx.rng.gen_range(-Self::SPREAD..=Self::SPREAD),
            0.,
        );
        if let Some(victim) = ctx.shoot(
            agent,
            target + spread,
            Self::RANGE,
            Self::BULLET_DAMAGE,
            DamageFlags::BULLET,
        ) {
            log::trace!("{}: hits {victim}", agent.id);
        }
        ctx.command(BodyCommand::EmitSound {
            class: SoundClass::COMBAT,
            radius: 1024.,
            duration: 0.3,
        });
        TaskOutcome::Running
    }

    fn throw_grenade(&self, agent: &Agent, ctx: &mut Context) -> TaskOutcome {
        let Some(enemy) = agent.enemy else {
            return TaskOutcome::Failed;
        };
        let blast = RadiusDamage {
            origin: enemy.last_known_position + Vec3::new(0., 0., 16.),
            inflictor: None,
            attacker: Some(agent.id),
            damage: Self::GRENADE_DAMAGE,
            radius: Self::GRENADE_RADIUS,
            flags: DamageFlags::BLAST,
            ignore: Some(Self::CLASSIFICATION),
        };
        let hits = ctx.radius_damage(&blast);
        log::debug!("{}: grenade hits {hits}", agent.id);
        TaskOutcome::Running
    }
}

impl Default for Grunt {
    fn default() -> Self {
        Self::new()
    }
}

impl MonsterBehavior for Grunt {
    fn name(&self) -> &'static str {
        "grunt"
    }

    fn repository(&self) -> &ScheduleRepository {
        &self.repository
    }

    fn check_melee_attack1(&self, _: &Agent, _: f32, _: f32, _: &CombatConfig) -> bool {
        false
    }

    fn check_range_attack1(
        &self,
        agent: &Agent,
        dot: f32,
        distance: f32,
        config: &CombatConfig,
    ) -> bool {
        agent.clip.map_or(true, |clip| !clip.is_empty())
            && distance >= config.range_min
            && distance <= Self::RANGE
            && dot >= config.range_cone
    }

    fn check_range_attack2(
        &self,
        agent: &Agent,
        _dot: f32,
        distance: f32,
        _config: &CombatConfig,
    ) -> bool {
        agent.clip.map_or(false, |clip| clip.is_empty())
            && distance >= Self::GRENADE_MIN_DISTANCE
            && distance <= Self::RANGE
    }

    fn attack(&self, kind: AttackKind, agent: &mut Agent, ctx: &mut Context) -> TaskOutcome {
        match kind {
            AttackKind::RangePrimary => self.fire(agent, ctx),
            AttackKind::RangeSecondary => self.throw_grenade(agent, ctx),
            _ => TaskOutcome::Failed,
        }
    }
}
