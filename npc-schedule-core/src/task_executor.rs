/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use rand::Rng;

use crate::{
    evaluate_conditions, facing_dot, Activity, ActiveSchedule, Agent, AttackKind, BodyCommand,
    Conditions, Context, FaceGoal, Memory, MonsterBehavior, MonsterState, PathGoal, RouteStatus,
    Schedule, SensingConfig, Task, TaskOutcome, TaskStatus,
};

/// The longest a facing task waits for the body to turn.
const FACE_TIMEOUT: f32 = 2.;

/// Runs one think of `agent`: sensing, life-cycle state, then schedule maintenance.
pub fn run_ai(agent: &mut Agent, behavior: &dyn MonsterBehavior, ctx: &mut Context) {
    if agent.is_alive() {
        evaluate_conditions(agent, behavior, ctx);
    } else {
        agent.conditions = Conditions::empty();
    }
    update_state(agent, ctx);
    maintain_schedule(agent, behavior, ctx);
}

/// The state `agent` should be in given its conditions and enemy.
pub fn compute_ideal_state(agent: &Agent, time: f32, config: &SensingConfig) -> MonsterState {
    use MonsterState::*;
    if agent.state.is_external() {
        return agent.state;
    }
    let conditions = agent.conditions;
    let engaged = agent.enemy.is_some()
        && conditions.intersects(Conditions::NEW_ENEMY | Conditions::SEE_ENEMY);
    let stimulus = match agent.state {
        Idle if engaged => Some(Combat),
        Idle if conditions.intersects(Conditions::DAMAGE | Conditions::HEAR_SOUND) => Some(Alert),
        Alert if engaged => Some(Combat),
        Combat | Hunt if agent.enemy.is_none() => Some(Alert),
        Combat if !conditions.contains(Conditions::SEE_ENEMY)
            && agent.time_since_enemy_seen(time) > config.hunt_delay =>
        {
            Some(Hunt)
        }
        Hunt if conditions.contains(Conditions::SEE_ENEMY) => Some(Combat),
        Combat | Hunt => Some(agent.state),
        _ => None,
    };
    stimulus.unwrap_or(agent.ideal_state)
}

fn update_state(agent: &mut Agent, ctx: &mut Context) {
    let ideal = compute_ideal_state(agent, ctx.time, &ctx.config.sensing);
    if ideal != agent.state {
        log::debug!("{}: state {:?} -> {:?}", agent.id, agent.state, ideal);
        abandon_schedule(agent, ctx);
        agent.state = ideal;
    }
    agent.ideal_state = ideal;
}

/// Drops the active schedule with the squad slot and positions it held.
fn abandon_schedule(agent: &mut Agent, ctx: &mut Context) {
    if let Some(squad) = ctx.squad_mut() {
        squad.vacate_slot(agent.id);
        squad.release_positions(agent.id);
    }
    agent.squad_slot = Default::default();
    agent.clear_schedule();
}

fn start_schedule(agent: &mut Agent, schedule: &'static Schedule) {
    log::debug!(
        "{}: {} -> {}",
        agent.id,
        agent.schedule_name().unwrap_or("none"),
        schedule.name
    );
    agent.active = Some(ActiveSchedule::new(schedule));
    agent.fail_override = None;
}

/// Keeps, interrupts or replaces the schedule of `agent`, then runs its tasks.
///
/// Tasks completing immediately are chained, up to the configured number per tick.
pub fn maintain_schedule(agent: &mut Agent, behavior: &dyn MonsterBehavior, ctx: &mut Context) {
    let repository = behavior.repository();

    let kept = agent.active.as_ref().map_or(false, |active| {
        !active.is_finished() && !active.schedule.is_interrupted(agent.conditions)
    });
    if !kept {
        if let Some(active) = &agent.active {
            log::debug!(
                "{}: {} interrupted by {:?}",
                agent.id,
                active.name(),
                active.schedule.interrupts & agent.conditions
            );
        }
        if let Some(squad) = ctx.squad_mut() {
            squad.release_positions(agent.id);
        }
        let schedule = repository.select_schedule(agent, ctx.squad.as_deref_mut());
        agent.pending_damage = Conditions::empty();
        start_schedule(agent, schedule);
    }

    for _ in 0..ctx.config.max_tasks_per_tick {
        let Some(active) = agent.active else {
            break;
        };
        let Some(task) = active.current_task() else {
            abandon_schedule(agent, ctx);
            break;
        };
        let outcome = match active.status {
            TaskStatus::NotStarted => {
                log::trace!("{}: start {}", agent.id, task);
                start_task(task, agent, behavior, ctx)
            }
            TaskStatus::Running => run_task(task, agent, behavior, ctx),
            TaskStatus::Complete => TaskOutcome::Complete,
            TaskStatus::Failed => TaskOutcome::Failed,
        };
        let Some(active) = agent.active.as_mut() else {
            break;
        };
        match outcome {
            TaskOutcome::Running => {
                active.status = TaskStatus::Running;
                break;
            }
            TaskOutcome::Complete => {
                log::trace!("{}: complete {}", agent.id, task);
                active.status = TaskStatus::Complete;
                active.advance();
                if active.is_finished() {
                    log::debug!("{}: {} finished", agent.id, active.name());
                    abandon_schedule(agent, ctx);
                    break;
                }
            }
            TaskOutcome::Failed => {
                active.status = TaskStatus::Failed;
                let failed = active.schedule;
                let failure =
                    repository.failure_schedule(failed, agent.fail_override, agent.state);
                log::debug!("{}: {} failed in {}", agent.id, task, failed.name);
                abandon_schedule(agent, ctx);
                start_schedule(agent, failure);
            }
        }
    }
}

fn face_point(goal: FaceGoal, agent: &Agent) -> Option<Vec3> {
    match goal {
        FaceGoal::Enemy => agent.enemy.map(|enemy| enemy.last_known_position),
        FaceGoal::BestSound => agent.best_sound.map(|sound| sound.position),
    }
}

fn is_facing(agent: &Agent, point: Vec3, ctx: &Context) -> bool {
    ctx.body(agent).map_or(false, |me| {
        let horizontal = Vec3::new(point.x - me.position.x, point.y - me.position.y, 0.);
        horizontal.length_squared() < 1.
            || facing_dot(&me, point) >= ctx.config.combat.facing_tolerance
    })
}

fn path_goal(goal: PathGoal, agent: &Agent, ctx: &mut Context) -> Option<Vec3> {
    match goal {
        PathGoal::Enemy => {
            if !agent.conditions.contains(Conditions::SEE_ENEMY) {
                return None;
            }
            let enemy = agent.enemy?;
            ctx.world.entity(enemy.handle).map(|info| info.position)
        }
        PathGoal::EnemyLastKnown => agent.enemy.map(|enemy| enemy.last_known_position),
        PathGoal::BestSound => agent.best_sound.map(|sound| sound.position),
        PathGoal::CoverFromEnemy(max_distance) => {
            let enemy = agent.enemy?;
            let threat = ctx
                .world
                .entity(enemy.handle)
                .map_or(enemy.last_known_position, |info| info.eye_position());
            find_cover(agent, threat, max_distance, ctx)
        }
        PathGoal::CoverFromBestSound(max_distance) => {
            let threat = agent.best_sound?.position;
            find_cover(agent, threat, max_distance, ctx)
        }
    }
}

/// The first reachable cover position that the squad lets this agent reserve.
fn find_cover(agent: &Agent, threat: Vec3, max_distance: f32, ctx: &mut Context) -> Option<Vec3> {
    let me = ctx.body(agent)?;
    let candidates = ctx.world.cover_candidates(threat, me.position, max_distance);
    for candidate in candidates {
        if !ctx.world.can_reach(agent.id, candidate) {
            continue;
        }
        let distance = me.position.distance(candidate);
        let reserved = match ctx.squad_mut() {
            Some(squad) => squad.reserve_position(agent.id, candidate, distance),
            None => true,
        };
        if reserved {
            return Some(candidate);
        }
    }
    None
}

/// Whether the destination of `agent` was reserved by another member of its squad.
fn taken_by_squad_mate(agent: &Agent, ctx: &Context) -> bool {
    match (agent.route_goal, ctx.squad.as_deref()) {
        (Some(goal), Some(squad)) => {
            matches!(squad.holder(goal), Some(holder) if holder != agent.id)
        }
        _ => false,
    }
}

fn speak(line: &'static str, agent: &Agent, ctx: &mut Context) {
    let time = ctx.time;
    let allowed = match ctx.squad_mut() {
        Some(squad) => squad.speak(time, false),
        None => true,
    };
    if allowed {
        ctx.command(BodyCommand::Speak(line));
    } else {
        log::trace!("{}: keeps quiet", agent.id);
    }
}

/// Starts `task`, returns its outcome if it completes or fails at once.
pub fn start_task(
    task: Task,
    agent: &mut Agent,
    behavior: &dyn MonsterBehavior,
    ctx: &mut Context,
) -> TaskOutcome {
    match task {
        Task::StopMoving => {
            agent.route_goal = None;
            ctx.command(BodyCommand::Stop);
            TaskOutcome::Complete
        }
        Task::SetActivity(activity) => {
            agent.activity = activity;
            ctx.command(BodyCommand::SetActivity(activity));
            TaskOutcome::Complete
        }
        Task::PlayActivity(activity) => {
            agent.activity = activity;
            ctx.command(BodyCommand::SetActivity(activity));
            TaskOutcome::Running
        }
        Task::Face(goal) => {
            let Some(point) = face_point(goal, agent) else {
                return TaskOutcome::Failed;
            };
            if is_facing(agent, point, ctx) {
                return TaskOutcome::Complete;
            }
            agent.task_deadline = ctx.time + FACE_TIMEOUT;
            ctx.command(BodyCommand::FaceTowards(point));
            TaskOutcome::Running
        }
        Task::Wait(duration) | Task::WaitFaceEnemy(duration) => {
            agent.task_deadline = ctx.time + duration;
            if duration <= 0. {
                TaskOutcome::Complete
            } else {
                run_task(task, agent, behavior, ctx)
            }
        }
        Task::WaitRandom(duration) => {
            let duration = ctx.rng.gen_range(0.0..=duration.max(0.));
            agent.task_deadline = ctx.time + duration;
            TaskOutcome::Running
        }
        Task::WaitIndefinite => TaskOutcome::Running,
        Task::GetPathTo(goal) => {
            let Some(goal) = path_goal(goal, agent, ctx) else {
                log::debug!("{}: no goal for {}", agent.id, task);
                return TaskOutcome::Failed;
            };
            if !ctx.world.can_reach(agent.id, goal) {
                log::debug!("{}: cannot reach {}", agent.id, goal);
                agent.remember(Memory::MOVE_FAILED);
                return TaskOutcome::Failed;
            }
            agent.route_goal = Some(goal);
            ctx.command(BodyCommand::MoveTo {
                goal,
                movement: agent.movement,
            });
            TaskOutcome::Complete
        }
        Task::SetMovement(movement) => {
            agent.movement = movement;
            if let Some(goal) = agent.route_goal {
                ctx.command(BodyCommand::MoveTo { goal, movement });
            }
            TaskOutcome::Complete
        }
        Task::WaitForMovement => {
            if agent.route_goal.is_none() {
                TaskOutcome::Complete
            } else {
                agent.activity = agent.movement.activity();
                TaskOutcome::Running
            }
        }
        Task::Attack(kind) => {
            if kind == AttackKind::RangePrimary {
                if let Some(clip) = &mut agent.clip {
                    if !clip.consume() {
                        return TaskOutcome::Failed;
                    }
                }
            }
            agent.activity = kind.activity();
            ctx.command(BodyCommand::SetActivity(agent.activity));
            behavior.attack(kind, agent, ctx)
        }
        Task::Reload => {
            if agent.clip.is_none() {
                return TaskOutcome::Complete;
            }
            agent.activity = Activity::Reload;
            ctx.command(BodyCommand::SetActivity(agent.activity));
            TaskOutcome::Running
        }
        Task::Speak(line) => {
            speak(line, agent, ctx);
            TaskOutcome::Complete
        }
        Task::AlertReaction(line) => {
            if agent.take_alert_reaction() {
                speak(line, agent, ctx);
            }
            TaskOutcome::Complete
        }
        Task::SuggestState(state) => {
            agent.ideal_state = state;
            TaskOutcome::Complete
        }
        Task::SetFailSchedule(name) => {
            agent.fail_override = Some(name);
            TaskOutcome::Complete
        }
        Task::Remember(memory) => {
            agent.remember(memory);
            TaskOutcome::Complete
        }
        Task::Forget(memory) => {
            agent.forget(memory);
            TaskOutcome::Complete
        }
        Task::Custom(id, param) => behavior.start_custom_task(id, param, agent, ctx),
    }
}

/// Continues a running `task`, polling the world for its progress.
pub fn run_task(
    task: Task,
    agent: &mut Agent,
    behavior: &dyn MonsterBehavior,
    ctx: &mut Context,
) -> TaskOutcome {
    match task {
        Task::PlayActivity(_) | Task::Attack(_) => {
            if ctx.world.activity_finished(agent.id) {
                TaskOutcome::Complete
            } else {
                TaskOutcome::Running
            }
        }
        Task::Reload => {
            if ctx.world.activity_finished(agent.id) {
                if let Some(clip) = &mut agent.clip {
                    clip.refill();
                }
                TaskOutcome::Complete
            } else {
                TaskOutcome::Running
            }
        }
        Task::Face(goal) => {
            let Some(point) = face_point(goal, agent) else {
                return TaskOutcome::Failed;
            };
            if is_facing(agent, point, ctx) || ctx.time >= agent.task_deadline {
                TaskOutcome::Complete
            } else {
                ctx.command(BodyCommand::FaceTowards(point));
                TaskOutcome::Running
            }
        }
        Task::Wait(_) | Task::WaitRandom(_) => {
            if ctx.time >= agent.task_deadline {
                TaskOutcome::Complete
            } else {
                TaskOutcome::Running
            }
        }
        Task::WaitFaceEnemy(_) => {
            if let Some(point) = face_point(FaceGoal::Enemy, agent) {
                if !is_facing(agent, point, ctx) {
                    ctx.command(BodyCommand::FaceTowards(point));
                }
            }
            if ctx.time >= agent.task_deadline {
                TaskOutcome::Complete
            } else {
                TaskOutcome::Running
            }
        }
        Task::WaitIndefinite => TaskOutcome::Running,
        Task::WaitForMovement => match ctx.world.route_status(agent.id) {
            _ if taken_by_squad_mate(agent, ctx) => {
                log::debug!("{}: destination taken by a squad-mate", agent.id);
                agent.route_goal = None;
                ctx.command(BodyCommand::Stop);
                TaskOutcome::Failed
            }
            RouteStatus::Moving => TaskOutcome::Running,
            RouteStatus::Arrived | RouteStatus::Idle => {
                agent.route_goal = None;
                TaskOutcome::Complete
            }
            RouteStatus::Failed => {
                agent.route_goal = None;
                agent.remember(Memory::MOVE_FAILED);
                TaskOutcome::Failed
            }
        },
        Task::Custom(id, param) => behavior.run_custom_task(id, param, agent, ctx),
        // instantaneous tasks never run
        _ => TaskOutcome::Complete,
    }
}
