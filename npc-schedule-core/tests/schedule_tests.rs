/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use lazy_static::lazy_static;
use npc_schedule_core::*;
use npc_schedule_utils::{Aabb, Body, OpenWorld, SimpleExecutor};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

static PATROL: Schedule = Schedule::new(
    "patrol",
    &[
        Task::StopMoving,
        Task::SetActivity(Activity::Walk),
        Task::Wait(5.),
        Task::Wait(5.),
        Task::StopMoving,
    ],
)
.interrupted_by(Conditions::NEW_ENEMY);

static ENGAGE: Schedule = Schedule::new(
    "engage",
    &[
        Task::Wait(3.),
        Task::Face(FaceGoal::Enemy),
        Task::WaitFaceEnemy(5.),
    ],
)
.interrupted_by(Conditions::ENEMY_DEAD);

static PATROL_RULES: &[ScheduleRule] = &[
    ScheduleRule::new(MonsterState::Idle, &PATROL),
    ScheduleRule::new(MonsterState::Combat, &ENGAGE).requires(Conditions::SEE_ENEMY),
];

struct Patroller {
    repository: ScheduleRepository,
}

impl MonsterBehavior for Patroller {
    fn name(&self) -> &'static str {
        "patroller"
    }

    fn repository(&self) -> &ScheduleRepository {
        &self.repository
    }
}

lazy_static! {
    static ref BASE: BaseBehavior = BaseBehavior::default();
    static ref PATROLLER: Patroller = {
        let mut repository = ScheduleRepository::base();
        repository.prepend_rules(PATROL_RULES).unwrap();
        Patroller { repository }
    };
}

fn config() -> EngineConfig {
    EngineConfig {
        seed: Some(42),
        ..Default::default()
    }
}

fn soldier(world: &mut OpenWorld, position: Vec3) -> Agent {
    let id = world.spawn(Body::new(Classification::HumanMilitary, position, 50.));
    Agent::new(id, Classification::HumanMilitary, 50.)
}

#[test]
fn schedule_interruption() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = OpenWorld::default();
    let agent = soldier(&mut world, Vec3::ZERO);
    let id = agent.id;
    let mut state = ();
    let mut executor = SimpleExecutor::new(config(), world, &mut state);
    executor.add_agent(agent, &*PATROLLER);

    executor.step();
    let active = executor.agent(id).unwrap().active.unwrap();
    assert_eq!(active.name(), "patrol");
    assert_eq!(active.task_index, 2);
    assert_eq!(active.status, TaskStatus::Running);

    let player = executor.world_mut().spawn(Body::new(
        Classification::Player,
        Vec3::new(300., 0., 0.),
        100.,
    ));
    executor.step();
    let agent = executor.agent(id).unwrap();
    assert!(agent.conditions.contains(Conditions::NEW_ENEMY));
    assert_eq!(agent.state, MonsterState::Combat);
    assert_eq!(agent.enemy.map(|enemy| enemy.handle), Some(player));
    let active = agent.active.unwrap();
    assert_eq!(active.name(), "engage");
    assert_eq!(active.task_index, 0);
    assert_eq!(active.status, TaskStatus::Running);
}

#[test]
fn uninterrupted_schedule_is_kept() {
    let mut world = OpenWorld::default();
    let agent = soldier(&mut world, Vec3::ZERO);
    let id = agent.id;
    let mut state = ();
    let mut executor = SimpleExecutor::new(config(), world, &mut state);
    executor.add_agent(agent, &*PATROLLER);
    executor.step();
    for _ in 0..10 {
        executor.step();
        let active = executor.agent(id).unwrap().active.unwrap();
        assert_eq!(active.name(), "patrol");
        assert_eq!(active.task_index, 2);
    }
    executor.run(45);
    let active = executor.agent(id).unwrap().active.unwrap();
    assert_eq!(active.name(), "patrol");
    assert_eq!(active.task_index, 3);
}

#[test]
fn selection_terminates_for_any_conditions() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for behavior in [&*BASE as &dyn MonsterBehavior, &*PATROLLER] {
        let repository = behavior.repository();
        assert_eq!(repository.validate(), Ok(()));
        for state in MonsterState::ALL {
            let mut samples = vec![Conditions::empty(), Conditions::all()];
            samples.extend(Conditions::all().iter());
            samples.extend((0..500).map(|_| Conditions::from_bits_truncate(rng.gen())));
            for conditions in samples {
                let mut agent = Agent::new(EntityId::new(0, 0), Classification::HumanMilitary, 50.)
                    .with_state(state);
                agent.conditions = conditions;
                agent.memory = Memory::from_bits_truncate(rng.gen());
                let schedule = repository.select_schedule(&mut agent, None);
                assert!(repository.get(schedule.name).is_some());
                assert!(!schedule.is_empty());
            }
        }
    }
}

#[test]
fn selection_replaces_the_active_schedule() {
    let repository = ScheduleRepository::base();
    let mut agent = Agent::new(EntityId::new(0, 0), Classification::HumanMilitary, 50.)
        .with_state(MonsterState::Combat);
    agent.active = Some(ActiveSchedule {
        task_index: 2,
        ..ActiveSchedule::new(&STANDOFF)
    });
    agent.conditions = Conditions::ENEMY_DEAD;
    let schedule = repository.select_schedule(&mut agent, None);
    assert_eq!(schedule.name, "victory-dance");
}

#[test]
fn failed_task_recovers_through_failure_schedule() {
    let mut world = OpenWorld::default();
    world.add_wall(Aabb::new(Vec3::new(100., -50., 0.), Vec3::new(110., 50., 200.)));
    world.emit_sound(SoundEvent {
        position: Vec3::new(300., 0., 0.),
        radius: 500.,
        class: SoundClass::WORLD,
        expires: 10.,
        emitter: None,
    });
    let agent = soldier(&mut world, Vec3::ZERO).with_state(MonsterState::Alert);
    let id = agent.id;
    let mut state = ();
    let mut executor = SimpleExecutor::new(config(), world, &mut state);
    executor.add_agent(agent, &*BASE);

    executor.step();
    let agent = executor.agent(id).unwrap();
    assert!(agent.has_memory(Memory::SUSPICIOUS | Memory::MOVE_FAILED));
    assert_eq!(agent.schedule_name(), Some("alert-stand"));
    assert_eq!(agent.state, MonsterState::Alert);

    // the world sound is not heard through the alert stand, which is kept
    executor.step();
    let agent = executor.agent(id).unwrap();
    assert_eq!(agent.schedule_name(), Some("alert-stand"));
    assert!(!agent.conditions.contains(Conditions::HEAR_SOUND));
}

#[test]
fn failing_failure_schedule_falls_back() {
    let repository = ScheduleRepository::base();
    let fallback = repository.failure_schedule(&FAIL, None, MonsterState::Combat);
    assert_eq!(fallback.name, "combat-face");
    let recovery = repository.failure_schedule(&CHASE_ENEMY, None, MonsterState::Combat);
    assert_eq!(recovery.name, "chase-enemy-failed");
    let overridden =
        repository.failure_schedule(&CHASE_ENEMY, Some("standoff"), MonsterState::Combat);
    assert_eq!(overridden.name, "standoff");
}

#[test]
fn squad_mates_share_the_enemy() {
    let mut world = OpenWorld::default();
    world.add_wall(Aabb::new(
        Vec3::new(250., -160., 0.),
        Vec3::new(350., -140., 200.),
    ));
    let spotter = soldier(&mut world, Vec3::ZERO);
    let flanker = soldier(&mut world, Vec3::new(300., -300., 0.));
    let (spotter_id, flanker_id) = (spotter.id, flanker.id);
    let player = world.spawn(Body::new(
        Classification::Player,
        Vec3::new(300., 0., 0.),
        100.,
    ));
    let mut state = ();
    let mut executor = SimpleExecutor::new(config(), world, &mut state);
    executor.add_agent(spotter, &*PATROLLER);
    executor.add_agent(flanker, &*PATROLLER);
    let squad = executor.form_squad(&[spotter_id, flanker_id]).unwrap();
    assert!(executor.form_squad(&[flanker_id]).is_none());

    executor.step();
    let record = executor.squads().get(squad).unwrap();
    assert_eq!(record.leader(), spotter_id);
    assert_eq!(record.shared_enemy().map(|enemy| enemy.handle), Some(player));
    assert_eq!(record.last_seen(), Some(0.));

    let flanker = executor.agent(flanker_id).unwrap();
    assert_eq!(flanker.enemy.map(|enemy| enemy.handle), Some(player));
    assert!(flanker
        .conditions
        .contains(Conditions::NEW_ENEMY | Conditions::ENEMY_OCCLUDED));
    assert!(!flanker.conditions.contains(Conditions::SEE_ENEMY));
    assert_eq!(flanker.state, MonsterState::Combat);
}

#[test]
fn removed_agents_leave_their_squad() {
    let mut world = OpenWorld::default();
    let a = soldier(&mut world, Vec3::ZERO);
    let b = soldier(&mut world, Vec3::new(0., 100., 0.));
    let (a_id, b_id) = (a.id, b.id);
    let mut state = ();
    let mut executor = SimpleExecutor::new(config(), world, &mut state);
    executor.add_agent(a, &*BASE);
    executor.add_agent(b, &*BASE);
    let squad = executor.form_squad(&[a_id, b_id]).unwrap();
    assert!(executor.remove_agent(a_id).is_some());
    let record = executor.squads().get(squad).unwrap();
    assert_eq!(record.leader(), b_id);
    assert_eq!(record.members(), &[b_id]);
    executor.remove_agent(b_id);
    assert!(executor.squads().is_empty());
}

#[test]
fn displaced_mover_gives_up_its_destination() {
    let mut world = OpenWorld::default();
    let config = config();
    let first = soldier(&mut world, Vec3::ZERO);
    let second = soldier(&mut world, Vec3::new(100., 0., 0.));
    let spot = Vec3::new(300., 0., 0.);
    let mut squad = SquadRecord::new(SquadId(0), first.id, &config.squad);
    squad.add_member(second.id);
    assert!(squad.reserve_position(first.id, spot, 300.));
    assert!(squad.reserve_position(second.id, spot, 200.));

    let mut damage = MultiDamage::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for (mut agent, expected) in [(first, TaskOutcome::Failed), (second, TaskOutcome::Complete)] {
        agent.route_goal = Some(spot);
        let mut commands = Vec::new();
        let mut ctx = Context {
            time: 0.,
            tick: 0,
            world: &world,
            sounds: &[],
            config: &config,
            squad: Some(&mut squad),
            damage: &mut damage,
            commands: &mut commands,
            rng: &mut rng,
        };
        let outcome = run_task(Task::WaitForMovement, &mut agent, &*BASE, &mut ctx);
        assert_eq!(outcome, expected);
        assert_eq!(agent.route_goal, None);
        if expected == TaskOutcome::Failed {
            assert_eq!(commands, vec![BodyCommand::Stop]);
        }
    }
}
