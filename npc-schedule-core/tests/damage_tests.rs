/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use npc_schedule_core::*;
use npc_schedule_utils::{Body, OpenWorld};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// An agent counting its death transitions.
struct Victim {
    agent: Agent,
    deaths: u32,
}

impl Damageable for Victim {
    fn health(&self) -> f32 {
        self.agent.health()
    }

    fn set_health(&mut self, health: f32) {
        self.agent.set_health(health);
    }

    fn takes_damage(&self) -> bool {
        self.agent.takes_damage()
    }

    fn hurt(&mut self, attacker: Option<EntityId>, amount: f32, flags: DamageFlags, flinch: bool) {
        self.agent.hurt(attacker, amount, flags, flinch);
    }

    fn killed(&mut self, attacker: Option<EntityId>, gib: bool, flags: DamageFlags) {
        self.deaths += 1;
        self.agent.killed(attacker, gib, flags);
    }
}

fn context<'a>(
    world: &'a OpenWorld,
    config: &'a EngineConfig,
    damage: &'a mut MultiDamage,
    commands: &'a mut Vec<BodyCommand>,
    rng: &'a mut ChaCha8Rng,
) -> Context<'a> {
    Context {
        time: 0.,
        tick: 0,
        world,
        sounds: &[],
        config,
        squad: None,
        damage,
        commands,
        rng,
    }
}

#[test]
fn lethal_hit_group_multiplier() {
    let mut config = EngineConfig::default();
    config.damage.hit_groups.stomach = 2.;
    let mut world = OpenWorld::default();
    let shooter_id = world.spawn(Body::new(Classification::HumanMilitary, Vec3::ZERO, 50.));
    let victim_id = world.spawn(Body::new(
        Classification::Player,
        Vec3::new(300., 0., 0.),
        30.,
    ));
    let shooter = Agent::new(shooter_id, Classification::HumanMilitary, 50.);
    let mut victim = Victim {
        agent: Agent::new(victim_id, Classification::Player, 30.),
        deaths: 0,
    };

    let mut damage = MultiDamage::new();
    let (mut commands, mut rng) = (Vec::new(), ChaCha8Rng::seed_from_u64(0));
    let target = world.entity(victim_id).unwrap().body_target();
    let mut ctx = context(&world, &config, &mut damage, &mut commands, &mut rng);
    let hit = ctx.shoot(&shooter, target, 1000., 20., DamageFlags::BULLET);
    assert_eq!(hit, Some(victim_id));

    let mut events = damage.take_events();
    assert_eq!(events.len(), 1);
    let event = &mut events[0];
    assert_eq!(event.victim(), victim_id);
    assert_eq!(event.contributions()[0].hit_group, HitGroup::Stomach);
    assert_eq!(event.total(), 40.);

    let outcome = event.commit(&mut victim, &config.damage);
    assert_eq!(
        outcome,
        DamageOutcome::Killed {
            amount: 40.,
            gib: false
        }
    );
    assert_eq!(victim.agent.health, -10.);
    assert_eq!(victim.agent.state, MonsterState::Dead);
    assert!(victim.agent.has_memory(Memory::KILLED));
    assert_eq!(victim.agent.last_attacker, Some(shooter_id));

    // later commits and later events change nothing
    assert_eq!(event.commit(&mut victim, &config.damage), DamageOutcome::Ignored);
    let mut again = DamageEvent::begin(victim_id);
    again.add(Some(shooter_id), 20., DamageFlags::BULLET);
    assert_eq!(again.commit(&mut victim, &config.damage), DamageOutcome::Absorbed);
    assert_eq!(victim.agent.health, -10.);
    assert_eq!(victim.deaths, 1);
}

#[test]
fn hits_of_one_window_are_summed() {
    let config = EngineConfig::default();
    let mut world = OpenWorld::default();
    let shooter_id = world.spawn(Body::new(Classification::HumanMilitary, Vec3::ZERO, 50.));
    let victim_id = world.spawn(Body::new(
        Classification::Player,
        Vec3::new(200., 0., 0.),
        100.,
    ));
    let shooter = Agent::new(shooter_id, Classification::HumanMilitary, 50.);
    let mut victim = Victim {
        agent: Agent::new(victim_id, Classification::Player, 100.),
        deaths: 0,
    };

    let mut damage = MultiDamage::new();
    let (mut commands, mut rng) = (Vec::new(), ChaCha8Rng::seed_from_u64(0));
    let target = world.entity(victim_id).unwrap().body_target();
    let mut ctx = context(&world, &config, &mut damage, &mut commands, &mut rng);
    // a burst of pellets
    for _ in 0..3 {
        ctx.shoot(&shooter, target, 1000., 5., DamageFlags::BULLET);
    }
    let mut events = damage.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].contributions().len(), 3);
    let outcome = events[0].commit(&mut victim, &config.damage);
    assert_eq!(
        outcome,
        DamageOutcome::Hurt {
            amount: 15.,
            flinch: false
        }
    );
    assert_eq!(victim.agent.health, 85.);
    assert!(victim.agent.pending_damage.contains(Conditions::LIGHT_DAMAGE));
    assert!(!victim.agent.pending_damage.contains(Conditions::HEAVY_DAMAGE));
    assert!(victim.agent.has_memory(Memory::PROVOKED));
}

#[test]
fn melee_strike_hits_what_is_in_front() {
    let config = EngineConfig::default();
    let mut world = OpenWorld::default();
    let striker_id = world.spawn(Body::new(Classification::AlienMonster, Vec3::ZERO, 50.));
    let victim_id = world.spawn(Body::new(
        Classification::Player,
        Vec3::new(40., 0., 0.),
        100.,
    ));
    let striker = Agent::new(striker_id, Classification::AlienMonster, 50.);

    let mut damage = MultiDamage::new();
    let (mut commands, mut rng) = (Vec::new(), ChaCha8Rng::seed_from_u64(0));
    let mut ctx = context(&world, &config, &mut damage, &mut commands, &mut rng);
    assert_eq!(
        ctx.melee_strike(&striker, 64., 10., DamageFlags::SLASH),
        Some(victim_id)
    );
    drop(ctx);
    world.body_mut(victim_id).unwrap().position = Vec3::new(-40., 0., 0.);
    let mut ctx = context(&world, &config, &mut damage, &mut commands, &mut rng);
    assert_eq!(ctx.melee_strike(&striker, 64., 10., DamageFlags::SLASH), None);
    assert_eq!(damage.take_events().len(), 1);
}

#[test]
fn radius_damage_falls_off_with_distance() {
    let mut world = OpenWorld::default();
    let distances = [30., 80., 130., 180., 230.];
    let ids: Vec<_> = distances
        .iter()
        .enumerate()
        .map(|(i, distance)| {
            let angle = i as f32 * std::f32::consts::FRAC_PI_3;
            let position = Vec3::new(angle.cos(), angle.sin(), 0.) * *distance;
            world.spawn(Body::new(Classification::HumanMilitary, position, 100.))
        })
        .collect();
    let blast = RadiusDamage {
        origin: Vec3::new(0., 0., 32.),
        inflictor: None,
        attacker: None,
        damage: 100.,
        radius: 250.,
        flags: DamageFlags::BLAST,
        ignore: None,
    };
    let mut ledger = MultiDamage::new();
    assert_eq!(blast.apply(&world, &mut ledger), distances.len());
    let events = ledger.take_events();
    let amounts: Vec<f32> = ids
        .iter()
        .map(|id| {
            events
                .iter()
                .find(|event| event.victim() == *id)
                .map_or(0., DamageEvent::total)
        })
        .collect();
    for pair in amounts.windows(2) {
        assert!(pair[0] >= pair[1], "{amounts:?}");
    }
    assert!((amounts[0] - 88.).abs() < 0.01);
    assert!(amounts.iter().all(|amount| *amount > 0. && *amount <= 100.));
}

#[test]
fn radius_damage_needs_line_of_sight_and_same_medium() {
    let mut world = OpenWorld::default();
    world.add_wall(npc_schedule_utils::Aabb::new(
        Vec3::new(50., -50., 0.),
        Vec3::new(60., 50., 200.),
    ));
    world.add_water(npc_schedule_utils::Aabb::new(
        Vec3::new(-200., -200., -100.),
        Vec3::new(-100., -100., 100.),
    ));
    let sheltered = world.spawn(Body::new(
        Classification::HumanMilitary,
        Vec3::new(100., 0., 0.),
        100.,
    ));
    let diver = world.spawn(Body::new(
        Classification::HumanMilitary,
        Vec3::new(-150., -150., 0.),
        100.,
    ));
    let exposed = world.spawn(Body::new(
        Classification::HumanMilitary,
        Vec3::new(0., 100., 0.),
        100.,
    ));
    let ally = world.spawn(Body::new(
        Classification::AlienMilitary,
        Vec3::new(0., -100., 0.),
        100.,
    ));
    let blast = RadiusDamage {
        origin: Vec3::new(0., 0., 32.),
        inflictor: None,
        attacker: None,
        damage: 100.,
        radius: 250.,
        flags: DamageFlags::BLAST,
        ignore: Some(Classification::AlienMilitary),
    };
    let mut ledger = MultiDamage::new();
    assert_eq!(blast.apply(&world, &mut ledger), 1);
    let victims: Vec<_> = ledger
        .take_events()
        .iter()
        .map(DamageEvent::victim)
        .collect();
    assert_eq!(victims, vec![exposed]);
    assert!(!victims.contains(&sheltered));
    assert!(!victims.contains(&diver));
    assert!(!victims.contains(&ally));
}

#[test]
fn armored_hits_ricochet_once_per_tick() {
    let mut ledger = MultiDamage::new();
    let victim = EntityId::new(3, 0);
    ledger.begin_tick(1);
    for _ in 0..4 {
        ledger.add_armored(
            victim,
            None,
            8.,
            DamageFlags::BULLET,
            HitGroup::Head,
            10.,
            Vec3::ZERO,
        );
    }
    assert!(ledger.add_armored(
        victim,
        None,
        25.,
        DamageFlags::BULLET,
        HitGroup::Head,
        10.,
        Vec3::ZERO
    ));
    assert_eq!(ledger.take_effects().len(), 1);
    let events = ledger.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].total(), 15.);
}
