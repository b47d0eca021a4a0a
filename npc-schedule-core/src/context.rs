/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use rand_chacha::ChaCha8Rng;

use crate::{
    Agent, BodyCommand, DamageFlags, EngineConfig, EntityId, EntityInfo, Hull, MultiDamage,
    RadiusDamage, SoundEvent, SquadRecord, WorldQuery,
};

/// Everything an agent may look at or act upon while it thinks.
///
/// The world is read-only during the think; effects on bodies are queued as
/// [BodyCommand]s and damage is collected in the [MultiDamage] ledger, both
/// handled by the caller once the agent is done.
pub struct Context<'a> {
    /// simulation time in seconds
    pub time: f32,
    pub tick: u64,
    pub world: &'a dyn WorldQuery,
    /// sounds currently broadcast
    pub sounds: &'a [SoundEvent],
    pub config: &'a EngineConfig,
    /// the squad of the agent, if any
    pub squad: Option<&'a mut SquadRecord>,
    pub damage: &'a mut MultiDamage,
    pub commands: &'a mut Vec<BodyCommand>,
    pub rng: &'a mut ChaCha8Rng,
}

impl<'a> Context<'a> {
    /// Queues a command for the body of the thinking agent.
    pub fn command(&mut self, command: BodyCommand) {
        self.commands.push(command);
    }

    /// Describes the body of `agent` in the world.
    pub fn body(&self, agent: &Agent) -> Option<EntityInfo> {
        self.world.entity(agent.id)
    }

    /// The squad of the agent, mutably.
    pub fn squad_mut(&mut self) -> Option<&mut SquadRecord> {
        self.squad.as_deref_mut()
    }

    /// Sweeps a melee hull `range` units in front of `agent` and damages whatever it hits.
    ///
    /// Returns the entity hit, if any.
    pub fn melee_strike(
        &mut self,
        agent: &Agent,
        range: f32,
        damage: f32,
        flags: DamageFlags,
    ) -> Option<EntityId> {
        let me = self.body(agent)?;
        let start = me.body_target();
        let end = start + me.forward * range;
        let trace = self.world.trace_hull(start, end, Hull::MELEE, Some(agent.id));
        let victim = trace.hit_entity?;
        let amount = self.config.damage.scale(damage, trace.hit_group);
        self.damage
            .add_to(victim, Some(agent.id), amount, flags, trace.hit_group);
        Some(victim)
    }

    /// Fires a ray from the eyes of `agent` towards `target`, scaling `damage` by the hit group.
    ///
    /// Returns the entity hit, if any; hitting the world does nothing.
    pub fn shoot(
        &mut self,
        agent: &Agent,
        target: Vec3,
        range: f32,
        damage: f32,
        flags: DamageFlags,
    ) -> Option<EntityId> {
        let me = self.body(agent)?;
        let start = me.eye_position();
        let direction = (target - start).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        let trace = self
            .world
            .trace_line(start, start + direction * range, Some(agent.id));
        let victim = trace.hit_entity?;
        let amount = self.config.damage.scale(damage, trace.hit_group);
        self.damage
            .add_to(victim, Some(agent.id), amount, flags, trace.hit_group);
        Some(victim)
    }

    /// Applies area damage, returns the number of entities hit.
    pub fn radius_damage(&mut self, attack: &RadiusDamage) -> usize {
        attack.apply(self.world, self.damage)
    }
}
