/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use crate::{
    default_relationship, Agent, AttackKind, Classification, CombatConfig, Context, Relationship,
    ScheduleRepository, SoundClass, TaskOutcome,
};

/// The type-specific part of a non-player character.
///
/// You need to implement at least [name](Self::name) and [repository](Self::repository);
/// everything else has defaults suited to a generic soldier.
pub trait MonsterBehavior: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// The schedules and selection rules of this behavior.
    fn repository(&self) -> &ScheduleRepository;

    /// How an agent of class `me` feels about an entity of class `other`.
    fn relationship(&self, me: Classification, other: Classification) -> Relationship {
        default_relationship(me, other)
    }

    /// The sound classes this behavior reacts to.
    fn hearing_mask(&self) -> SoundClass {
        SoundClass::all()
    }

    /// Whether the primary melee attack may hit, given the cosine between the facing
    /// direction and the direction to the enemy, and the distance to the enemy.
    fn check_melee_attack1(
        &self,
        _agent: &Agent,
        dot: f32,
        distance: f32,
        config: &CombatConfig,
    ) -> bool {
        distance <= config.melee_range && dot >= config.melee_cone
    }

    fn check_melee_attack2(
        &self,
        _agent: &Agent,
        _dot: f32,
        _distance: f32,
        _config: &CombatConfig,
    ) -> bool {
        false
    }

    fn check_range_attack1(
        &self,
        _agent: &Agent,
        dot: f32,
        distance: f32,
        config: &CombatConfig,
    ) -> bool {
        distance >= config.range_min && distance <= config.range_max && dot >= config.range_cone
    }

    fn check_range_attack2(
        &self,
        _agent: &Agent,
        _dot: f32,
        _distance: f32,
        _config: &CombatConfig,
    ) -> bool {
        false
    }

    /// Performs an attack, typically dealing damage through the context.
    ///
    /// Return `Running` to wait for the attack activity to play through, `Complete` if
    /// the attack is done, `Failed` if it could not be performed.
    #[allow(unused)]
    fn attack(&self, kind: AttackKind, agent: &mut Agent, ctx: &mut Context) -> TaskOutcome {
        TaskOutcome::Failed
    }

    /// Starts a behavior-specific task.
    #[allow(unused)]
    fn start_custom_task(
        &self,
        id: u16,
        param: f32,
        agent: &mut Agent,
        ctx: &mut Context,
    ) -> TaskOutcome {
        log::warn!("{}: unknown custom task {id}", self.name());
        TaskOutcome::Failed
    }

    /// Continues a behavior-specific task that returned `Running` when started.
    #[allow(unused)]
    fn run_custom_task(
        &self,
        id: u16,
        param: f32,
        agent: &mut Agent,
        ctx: &mut Context,
    ) -> TaskOutcome {
        TaskOutcome::Complete
    }
}

/// A behavior running the base library only, without attacks.
pub struct BaseBehavior {
    repository: ScheduleRepository,
}

impl Default for BaseBehavior {
    fn default() -> Self {
        Self {
            repository: ScheduleRepository::base(),
        }
    }
}

impl MonsterBehavior for BaseBehavior {
    fn name(&self) -> &'static str {
        "base"
    }

    fn repository(&self) -> &ScheduleRepository {
        &self.repository
    }

    fn check_melee_attack1(&self, _: &Agent, _: f32, _: f32, _: &CombatConfig) -> bool {
        false
    }

    fn check_range_attack1(&self, _: &Agent, _: f32, _: f32, _: &CombatConfig) -> bool {
        false
    }
}
