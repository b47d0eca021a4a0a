use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use lazy_static::lazy_static;
use npc_schedule_core::*;
use npc_schedule_utils::{Aabb, Body, OpenWorld, SimpleExecutor};

lazy_static! {
    static ref BASE: BaseBehavior = BaseBehavior::default();
}

const CONFIG: EngineConfig = EngineConfig {
    tick_interval: 0.1,
    max_tasks_per_tick: 10,
    seed: Some(0),
    sensing: SensingConfig {
        sensing_radius: 2048.,
        field_of_view: 0.5,
        hearing_sensitivity: 1.,
        rediscovery_threshold: 5.,
        forget_timeout: 10.,
        forget_distance: 512.,
        too_far_distance: 1024.,
        hunt_delay: 3.,
    },
    combat: CombatConfig {
        melee_range: 64.,
        melee_cone: 0.7,
        range_min: 64.,
        range_max: 784.,
        range_cone: 0.5,
        facing_tolerance: 0.95,
    },
    damage: DamageConfig {
        flinch_threshold: 20.,
        gib_health: -30.,
        skill: SkillLevel::Medium,
        skill_scale: SkillScale {
            easy: 0.6,
            medium: 1.,
            hard: 1.5,
        },
        hit_groups: HitGroupMultipliers {
            head: 3.,
            chest: 1.,
            stomach: 1.,
            arm: 1.,
            leg: 1.,
        },
    },
    squad: SquadConfig {
        max_members: 5,
        bucket_size: 128.,
        reservation_capacity: 8,
        speech_interval: 3.,
    },
};

/// A grid of soldiers facing a line of players, with a few walls and cover points in between.
fn battlefield(soldiers: u32) -> (OpenWorld, Vec<Agent>) {
    let mut world = OpenWorld::default();
    for i in 0..4 {
        let x = 400. + 150. * i as f32;
        world.add_wall(Aabb::new(Vec3::new(x, -40., 0.), Vec3::new(x + 10., 40., 96.)));
        world.add_cover_point(Vec3::new(x + 40., 0., 0.));
    }
    let agents = (0..soldiers)
        .map(|i| {
            let position = Vec3::new(100. * (i % 8) as f32, 100. * (i / 8) as f32, 0.);
            let id = world.spawn(Body::new(Classification::HumanMilitary, position, 50.));
            Agent::new(id, Classification::HumanMilitary, 50.).with_clip(8)
        })
        .collect();
    for i in 0..4 {
        world.spawn(Body::new(
            Classification::Player,
            Vec3::new(1200., 200. * i as f32, 0.),
            100.,
        ));
    }
    (world, agents)
}

fn think_benchmark(c: &mut Criterion) {
    for soldiers in [8, 64] {
        c.bench_function(&format!("tick_{soldiers}_agents"), |b| {
            b.iter_batched(
                || battlefield(soldiers),
                |(world, agents)| {
                    let mut state = ();
                    let mut executor = SimpleExecutor::new(CONFIG, world, &mut state);
                    for agent in agents {
                        executor.add_agent(agent, &*BASE);
                    }
                    executor.run(black_box(20));
                    black_box(executor.tick());
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, think_benchmark);
criterion_main!(benches);
