/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use npc_schedule_core::{
    Activity, BodyCommand, Classification, CosmeticEffect, DamageFlags, DamageOutcome,
    Damageable, EntityArena, EntityId, EntityInfo, HitGroup, Hull, Movement, RouteStatus,
    SoundEvent, TraceResult, WaterLevel, WorldQuery,
};
use serde::{Deserialize, Serialize};

use crate::{Aabb, ExecutorWorld};

/// Movement speeds and animation timing of the bodies of an [OpenWorld].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OpenWorldConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    /// how long one-shot activities (attacks, flinches, ...) take to play
    pub activity_duration: f32,
}

impl Default for OpenWorldConfig {
    fn default() -> Self {
        Self {
            walk_speed: 100.,
            run_speed: 220.,
            activity_duration: 0.5,
        }
    }
}

/// A physical entity of an [OpenWorld].
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub classification: Classification,
    /// position of the feet
    pub position: Vec3,
    pub forward: Vec3,
    pub half_extents: Vec3,
    pub view_height: f32,
    pub health: f32,
    pub alive: bool,
    pub takes_damage: bool,
    pub is_client: bool,
    pub activity: Activity,
    activity_ends: f32,
    route: Option<(Vec3, Movement)>,
    route_status: RouteStatus,
}

impl Body {
    pub fn new(classification: Classification, position: Vec3, health: f32) -> Self {
        Self {
            classification,
            position,
            forward: Vec3::X,
            half_extents: Hull::HUMAN.half_extents,
            view_height: 64.,
            health,
            alive: true,
            takes_damage: true,
            is_client: false,
            activity: Activity::Idle,
            activity_ends: 0.,
            route: None,
            route_status: RouteStatus::Idle,
        }
    }

    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward.normalize_or_zero();
        self
    }

    pub fn client(mut self) -> Self {
        self.is_client = true;
        self
    }

    /// The bounding box of the body.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(
            self.position + Vec3::Z * self.half_extents.z,
            self.half_extents,
        )
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Z * self.view_height
    }

    /// The body part at a given point, from its height on the body.
    pub fn hit_group(&self, point: Vec3) -> HitGroup {
        let height = 2. * self.half_extents.z;
        if height <= 0. {
            return HitGroup::Generic;
        }
        let relative = (point.z - self.position.z) / height;
        if relative > 0.8 {
            HitGroup::Head
        } else if relative > 0.6 {
            HitGroup::Chest
        } else if relative > 0.4 {
            HitGroup::Stomach
        } else if (point - self.position).dot(self.forward.cross(Vec3::Z)) > 0. {
            HitGroup::RightLeg
        } else {
            HitGroup::LeftLeg
        }
    }

    pub fn route_status(&self) -> RouteStatus {
        self.route_status
    }
}

impl Damageable for Body {
    fn health(&self) -> f32 {
        self.health
    }

    fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    fn takes_damage(&self) -> bool {
        self.takes_damage && self.alive
    }

    fn killed(&mut self, _attacker: Option<EntityId>, _gib: bool, _flags: DamageFlags) {
        self.alive = false;
        self.route = None;
        self.route_status = RouteStatus::Idle;
    }
}

/// A small reference world: bodies in an open space with box walls, water volumes,
/// predefined cover points and straight-line locomotion.
#[derive(Default)]
pub struct OpenWorld {
    pub config: OpenWorldConfig,
    bodies: EntityArena<Body>,
    walls: Vec<Aabb>,
    water: Vec<Aabb>,
    cover_points: Vec<Vec3>,
    sounds: Vec<SoundEvent>,
    time: f32,
    speech: Vec<(EntityId, &'static str)>,
    effects: Vec<CosmeticEffect>,
}

impl OpenWorld {
    pub fn new(config: OpenWorldConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn spawn(&mut self, body: Body) -> EntityId {
        self.bodies.insert(body)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Body> {
        self.bodies.remove(id)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> {
        self.bodies.iter()
    }

    pub fn add_wall(&mut self, wall: Aabb) {
        self.walls.push(wall);
    }

    pub fn add_water(&mut self, volume: Aabb) {
        self.water.push(volume);
    }

    pub fn add_cover_point(&mut self, point: Vec3) {
        self.cover_points.push(point);
    }

    pub fn emit_sound(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Lines spoken so far, in order.
    pub fn speech(&self) -> &[(EntityId, &'static str)] {
        &self.speech
    }

    /// Cosmetic effects rendered so far, in order.
    pub fn effects(&self) -> &[CosmeticEffect] {
        &self.effects
    }

    fn water_level(&self, body: &Body) -> WaterLevel {
        if self.is_underwater(body.eye_position()) {
            WaterLevel::Eyes
        } else if self.is_underwater(body.position + Vec3::Z * body.half_extents.z) {
            WaterLevel::Waist
        } else if self.is_underwater(body.position) {
            WaterLevel::Feet
        } else {
            WaterLevel::Dry
        }
    }

    /// Traces a segment swept by a box of `half_extents` against the walls and,
    /// if `with_bodies`, against the living bodies.
    fn trace(
        &self,
        start: Vec3,
        end: Vec3,
        half_extents: Vec3,
        ignore: Option<EntityId>,
        with_bodies: bool,
    ) -> TraceResult {
        let mut result = TraceResult::clear(end);
        for wall in &self.walls {
            if let Some((fraction, normal)) = wall.expanded(half_extents).segment_hit(start, end) {
                if fraction < result.fraction {
                    result = TraceResult {
                        fraction,
                        end: start.lerp(end, fraction),
                        hit_entity: None,
                        hit_group: HitGroup::Generic,
                        plane_normal: normal,
                    };
                }
            }
        }
        if with_bodies {
            for (id, body) in self.bodies.iter() {
                if Some(id) == ignore || !body.alive {
                    continue;
                }
                let bounds = body.bounds().expanded(half_extents);
                if let Some((fraction, normal)) = bounds.segment_hit(start, end) {
                    if fraction < result.fraction {
                        let point = start.lerp(end, fraction);
                        result = TraceResult {
                            fraction,
                            end: point,
                            hit_entity: Some(id),
                            hit_group: body.hit_group(point),
                            plane_normal: normal,
                        };
                    }
                }
            }
        }
        result
    }

    fn advance_body(body: &mut Body, config: &OpenWorldConfig, dt: f32) {
        let Some((goal, movement)) = body.route else {
            return;
        };
        let speed = match movement {
            Movement::Walk => config.walk_speed,
            Movement::Run => config.run_speed,
        };
        let to_goal = goal - body.position;
        let step = speed * dt;
        if to_goal.length() <= step {
            body.position = goal;
            body.route = None;
            body.route_status = RouteStatus::Arrived;
        } else {
            let direction = to_goal.normalize_or_zero();
            body.position += direction * step;
            let horizontal = Vec3::new(direction.x, direction.y, 0.);
            if horizontal.length_squared() > 0. {
                body.forward = horizontal.normalize();
            }
        }
    }

    fn is_looping(activity: Activity) -> bool {
        matches!(
            activity,
            Activity::Idle
                | Activity::CombatIdle
                | Activity::Walk
                | Activity::Run
                | Activity::Crouch
        )
    }
}

impl WorldQuery for OpenWorld {
    fn trace_line(&self, start: Vec3, end: Vec3, ignore: Option<EntityId>) -> TraceResult {
        self.trace(start, end, Vec3::ZERO, ignore, true)
    }

    fn trace_hull(
        &self,
        start: Vec3,
        end: Vec3,
        hull: Hull,
        ignore: Option<EntityId>,
    ) -> TraceResult {
        self.trace(start, end, hull.half_extents, ignore, true)
    }

    fn entities_in_sphere(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.position.distance(center) <= radius)
            .map(|(id, _)| id)
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntityInfo> {
        let body = self.bodies.get(id)?;
        Some(EntityInfo {
            id,
            classification: body.classification,
            position: body.position,
            view_offset: Vec3::Z * body.view_height,
            forward: body.forward,
            health: body.health,
            alive: body.alive,
            takes_damage: body.takes_damage,
            is_client: body.is_client,
            water_level: self.water_level(body),
        })
    }

    fn can_reach(&self, mover: EntityId, goal: Vec3) -> bool {
        let Some(body) = self.bodies.get(mover) else {
            return false;
        };
        // sweep at waist height, slightly thinner than the body to slide along walls
        let lift = Vec3::Z * body.half_extents.z;
        let half_extents = Vec3::new(body.half_extents.x, body.half_extents.y, 1.) * 0.9;
        self.trace(body.position + lift, goal + lift, half_extents, Some(mover), false)
            .is_clear()
    }

    fn cover_candidates(&self, threat: Vec3, near: Vec3, max_distance: f32) -> Vec<Vec3> {
        let mut candidates: Vec<Vec3> = self
            .cover_points
            .iter()
            .copied()
            .filter(|point| point.distance(near) <= max_distance)
            .filter(|point| {
                !self
                    .trace(threat, *point + Vec3::Z * 64., Vec3::ZERO, None, false)
                    .is_clear()
            })
            .collect();
        candidates.sort_by(|a, b| a.distance(near).total_cmp(&b.distance(near)));
        candidates
    }

    fn route_status(&self, entity: EntityId) -> RouteStatus {
        self.bodies
            .get(entity)
            .map_or(RouteStatus::Failed, |body| body.route_status)
    }

    fn activity_finished(&self, entity: EntityId) -> bool {
        self.bodies
            .get(entity)
            .map_or(true, |body| self.time >= body.activity_ends)
    }

    fn is_underwater(&self, point: Vec3) -> bool {
        self.water.iter().any(|volume| volume.contains(point))
    }

    fn active_sounds(&self, time: f32) -> Vec<SoundEvent> {
        self.sounds
            .iter()
            .filter(|sound| sound.expires >= time)
            .copied()
            .collect()
    }
}

impl ExecutorWorld for OpenWorld {
    fn apply_commands(&mut self, agent: EntityId, commands: &[BodyCommand]) {
        for command in commands {
            if let BodyCommand::MoveTo { goal, .. } = command {
                if !self.can_reach(agent, *goal) {
                    if let Some(body) = self.bodies.get_mut(agent) {
                        body.route = None;
                        body.route_status = RouteStatus::Failed;
                    }
                    continue;
                }
            }
            let time = self.time;
            let activity_duration = self.config.activity_duration;
            let Some(body) = self.bodies.get_mut(agent) else {
                return;
            };
            match *command {
                BodyCommand::Stop => {
                    body.route = None;
                    body.route_status = RouteStatus::Idle;
                }
                BodyCommand::MoveTo { goal, movement } => {
                    body.route = Some((goal, movement));
                    body.route_status = RouteStatus::Moving;
                }
                BodyCommand::SetActivity(activity) => {
                    body.activity = activity;
                    body.activity_ends = if Self::is_looping(activity) {
                        time
                    } else {
                        time + activity_duration
                    };
                }
                BodyCommand::FaceTowards(point) => {
                    let direction = point - body.position;
                    let horizontal = Vec3::new(direction.x, direction.y, 0.);
                    if horizontal.length_squared() > 0. {
                        body.forward = horizontal.normalize();
                    }
                }
                BodyCommand::Speak(line) => {
                    log::info!("{agent} says \"{line}\"");
                    self.speech.push((agent, line));
                }
                BodyCommand::EmitSound {
                    class,
                    radius,
                    duration,
                } => {
                    let position = body.position;
                    self.sounds.push(SoundEvent {
                        position,
                        radius,
                        class,
                        expires: time + duration,
                        emitter: Some(agent),
                    });
                }
            }
        }
    }

    fn damageable(&mut self, id: EntityId) -> Option<&mut dyn Damageable> {
        self.bodies
            .get_mut(id)
            .map(|body| body as &mut dyn Damageable)
    }

    fn on_damage(&mut self, victim: EntityId, outcome: DamageOutcome, health: f32) {
        if let Some(body) = self.bodies.get_mut(victim) {
            body.health = health;
            if outcome.is_kill() {
                body.killed(None, false, DamageFlags::empty());
            }
        }
    }

    fn render_effects(&mut self, effects: &[CosmeticEffect]) {
        self.effects.extend_from_slice(effects);
    }

    fn advance(&mut self, time: f32, dt: f32) {
        let config = self.config.clone();
        for (_, body) in self.bodies.iter_mut() {
            if body.alive {
                Self::advance_body(body, &config, dt);
            }
        }
        self.time = time;
        self.sounds.retain(|sound| sound.expires >= time);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use npc_schedule_core::*;

    use crate::*;

    fn world_with_wall() -> (OpenWorld, EntityId, EntityId) {
        let mut world = OpenWorld::default();
        world.add_wall(Aabb::new(Vec3::new(100., -50., 0.), Vec3::new(110., 50., 200.)));
        let a = world.spawn(Body::new(Classification::HumanMilitary, Vec3::ZERO, 50.));
        let b = world.spawn(Body::new(Classification::Player, Vec3::new(200., 0., 0.), 100.));
        (world, a, b)
    }

    #[test]
    fn walls_block_sight() {
        let (mut world, a, b) = world_with_wall();
        let eye_a = world.entity(a).unwrap().eye_position();
        let eye_b = world.entity(b).unwrap().eye_position();
        let trace = world.trace_line(eye_a, eye_b, Some(a));
        assert!(!trace.is_clear());
        assert_eq!(trace.hit_entity, None);
        world.body_mut(b).unwrap().position = Vec3::new(50., 0., 0.);
        let eye_b = world.entity(b).unwrap().eye_position();
        let trace = world.trace_line(eye_a, eye_b, Some(a));
        assert_eq!(trace.hit_entity, Some(b));
        assert_eq!(trace.hit_group, HitGroup::Head);
    }

    #[test]
    fn movement_reaches_goal() {
        let (mut world, a, _) = world_with_wall();
        let goal = Vec3::new(0., 150., 0.);
        world.apply_commands(
            a,
            &[BodyCommand::MoveTo {
                goal,
                movement: Movement::Run,
            }],
        );
        assert_eq!(world.route_status(a), RouteStatus::Moving);
        world.advance(0.5, 0.5);
        assert_eq!(world.route_status(a), RouteStatus::Moving);
        world.advance(1.0, 0.5);
        assert_eq!(world.route_status(a), RouteStatus::Arrived);
        assert_eq!(world.body(a).unwrap().position, goal);
    }

    #[test]
    fn blocked_route_fails() {
        let (mut world, a, _) = world_with_wall();
        world.apply_commands(
            a,
            &[BodyCommand::MoveTo {
                goal: Vec3::new(300., 0., 0.),
                movement: Movement::Walk,
            }],
        );
        assert_eq!(world.route_status(a), RouteStatus::Failed);
    }

    #[test]
    fn cover_hidden_from_threat() {
        let (mut world, _, _) = world_with_wall();
        world.add_cover_point(Vec3::new(150., 0., 0.));
        world.add_cover_point(Vec3::new(-50., 0., 0.));
        let threat = Vec3::new(0., 0., 64.);
        let cover = world.cover_candidates(threat, Vec3::new(200., 0., 0.), 300.);
        assert_eq!(cover, vec![Vec3::new(150., 0., 0.)]);
    }

    #[test]
    fn water_levels() {
        let (mut world, a, _) = world_with_wall();
        world.add_water(Aabb::new(Vec3::new(-20., -20., -100.), Vec3::new(20., 20., 40.)));
        assert_eq!(world.entity(a).unwrap().water_level, WaterLevel::Waist);
        world.add_water(Aabb::new(Vec3::new(-20., -20., 0.), Vec3::new(20., 20., 100.)));
        assert_eq!(world.entity(a).unwrap().water_level, WaterLevel::Eyes);
    }

    #[test]
    fn one_shot_activities_take_time() {
        let (mut world, a, _) = world_with_wall();
        world.apply_commands(a, &[BodyCommand::SetActivity(Activity::MeleeAttack1)]);
        assert!(!world.activity_finished(a));
        world.advance(0.5, 0.5);
        assert!(world.activity_finished(a));
        world.apply_commands(a, &[BodyCommand::SetActivity(Activity::Idle)]);
        assert!(world.activity_finished(a));
    }
}
