/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{EnemyRef, EntityId, SquadConfig};

/// The identifier of a squad.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquadId(pub u32);

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

bitflags! {
    /// Tactical roles of which only one member of a squad may hold each at a time.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SquadSlots: u16 {
        const ATTACK1 = 1 << 0;
        const ATTACK2 = 1 << 1;
        const GRENADE1 = 1 << 2;
        const GRENADE2 = 1 << 3;
        const CHASE = 1 << 4;
        const INVESTIGATE = 1 << 5;
    }
}

impl SquadSlots {
    pub const ATTACK: Self = Self::ATTACK1.union(Self::ATTACK2);
    pub const GRENADE: Self = Self::GRENADE1.union(Self::GRENADE2);
}

type Bucket = (i32, i32, i32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Reservation {
    owner: EntityId,
    bucket: Bucket,
    position: Vec3,
    /// distance between the owner and the position when reserving
    distance: f32,
}

/// Who may talk in the squad next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeechGate {
    pub next_speak_time: f32,
    pub question_pending: bool,
}

/// The state shared by the members of a squad.
///
/// Enemy information is updated by freshness: a sighting older than the one on record is
/// ignored, whatever the order in which members report.
#[derive(Clone, Debug)]
pub struct SquadRecord {
    pub id: SquadId,
    leader: EntityId,
    members: Vec<EntityId>,
    enemy: Option<EnemyRef>,
    last_seen: Option<f32>,
    enemy_eluded: bool,
    reservations: Vec<Reservation>,
    slots: FxHashMap<EntityId, SquadSlots>,
    pub speech: SpeechGate,
    config: SquadConfig,
}

impl SquadRecord {
    pub fn new(id: SquadId, leader: EntityId, config: &SquadConfig) -> Self {
        Self {
            id,
            leader,
            members: vec![leader],
            enemy: None,
            last_seen: None,
            enemy_eluded: false,
            reservations: Vec::with_capacity(config.reservation_capacity),
            slots: FxHashMap::default(),
            speech: SpeechGate::default(),
            config: config.clone(),
        }
    }

    pub fn leader(&self) -> EntityId {
        self.leader
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn is_member(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds a member, returns false if the squad is full or already contains it.
    pub fn add_member(&mut self, id: EntityId) -> bool {
        if self.is_member(id) || self.members.len() >= self.config.max_members {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Removes a member with its slots and reservations, promoting a new leader if needed.
    ///
    /// Returns the new leader if the leadership changed.
    pub fn remove_member(&mut self, id: EntityId) -> Option<EntityId> {
        self.members.retain(|member| *member != id);
        self.vacate_slot(id);
        self.release_positions(id);
        if id != self.leader {
            return None;
        }
        let new_leader = self.members.first().copied()?;
        log::debug!("{}: leader {} left, {} takes over", self.id, id, new_leader);
        self.leader = new_leader;
        Some(new_leader)
    }

    pub fn shared_enemy(&self) -> Option<&EnemyRef> {
        self.enemy.as_ref()
    }

    pub fn last_seen(&self) -> Option<f32> {
        self.last_seen
    }

    /// Records a sighting of `enemy` at `time`, returns whether it replaced the record.
    pub fn report_sighting(&mut self, enemy: EnemyRef, time: f32) -> bool {
        if let Some(last_seen) = self.last_seen {
            if time < last_seen {
                return false;
            }
        }
        self.enemy = Some(enemy);
        self.last_seen = Some(time);
        self.enemy_eluded = false;
        true
    }

    /// Clears the shared enemy if it is `handle`.
    pub fn clear_enemy(&mut self, handle: EntityId) {
        if self.enemy.map(|enemy| enemy.handle) == Some(handle) {
            self.enemy = None;
            self.enemy_eluded = false;
        }
    }

    pub fn mark_eluded(&mut self) {
        if self.enemy.is_some() {
            self.enemy_eluded = true;
        }
    }

    pub fn is_eluded(&self) -> bool {
        self.enemy_eluded
    }

    /// The slots currently held by any member.
    pub fn occupied_slots(&self) -> SquadSlots {
        self.slots
            .values()
            .fold(SquadSlots::empty(), |all, slots| all | *slots)
    }

    pub fn slots_of(&self, member: EntityId) -> SquadSlots {
        self.slots.get(&member).copied().unwrap_or_default()
    }

    /// Gives `member` one of the `wanted` slots, returns the one held or `None` if all are taken.
    pub fn occupy_slot(&mut self, member: EntityId, wanted: SquadSlots) -> Option<SquadSlots> {
        let held = self.slots_of(member) & wanted;
        if !held.is_empty() {
            return Some(held);
        }
        let taken = self.occupied_slots();
        let free = wanted.difference(taken).iter().next()?;
        self.slots.insert(member, free);
        Some(free)
    }

    pub fn vacate_slot(&mut self, member: EntityId) {
        self.slots.remove(&member);
    }

    fn bucket(&self, position: Vec3) -> Bucket {
        let cell = (position / self.config.bucket_size).floor();
        (cell.x as i32, cell.y as i32, cell.z as i32)
    }

    /// Reserves `position` for `member`, which is at `distance` from it.
    ///
    /// The request is refused if a squad-mate at least as close holds the same bucket,
    /// or if the table is full.
    pub fn reserve_position(&mut self, member: EntityId, position: Vec3, distance: f32) -> bool {
        let bucket = self.bucket(position);
        if let Some(existing) = self.reservations.iter_mut().find(|r| r.bucket == bucket) {
            if existing.owner != member && existing.distance <= distance {
                return false;
            }
            *existing = Reservation {
                owner: member,
                bucket,
                position,
                distance,
            };
            return true;
        }
        if self.reservations.len() >= self.config.reservation_capacity {
            log::debug!("{}: reservation table full", self.id);
            return false;
        }
        self.reservations.push(Reservation {
            owner: member,
            bucket,
            position,
            distance,
        });
        true
    }

    /// The positions held by `member`.
    pub fn reserved_by(&self, member: EntityId) -> impl Iterator<Item = Vec3> + '_ {
        self.reservations
            .iter()
            .filter(move |r| r.owner == member)
            .map(|r| r.position)
    }

    /// The member holding exactly `position`, if it is reserved.
    pub fn holder(&self, position: Vec3) -> Option<EntityId> {
        self.reservations
            .iter()
            .find(|r| r.position == position)
            .map(|r| r.owner)
    }

    pub fn release_positions(&mut self, member: EntityId) {
        self.reservations.retain(|r| r.owner != member);
    }

    pub fn ok_to_speak(&self, time: f32) -> bool {
        time >= self.speech.next_speak_time
    }

    /// Books the speech turn, returns false if someone spoke too recently.
    pub fn speak(&mut self, time: f32, question: bool) -> bool {
        if !self.ok_to_speak(time) {
            return false;
        }
        self.speech.next_speak_time = time + self.config.speech_interval;
        self.speech.question_pending = question;
        true
    }
}

/// All squads of a world.
#[derive(Default)]
pub struct Squads {
    records: BTreeMap<SquadId, SquadRecord>,
    next_id: u32,
}

impl Squads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forms a squad led by the first of `members`, `None` if `members` is empty.
    pub fn form(&mut self, members: &[EntityId], config: &SquadConfig) -> Option<SquadId> {
        let (&leader, others) = members.split_first()?;
        let id = SquadId(self.next_id);
        self.next_id += 1;
        let mut record = SquadRecord::new(id, leader, config);
        for member in others {
            if !record.add_member(*member) {
                log::warn!("{id}: cannot add {member}, squad full");
            }
        }
        self.records.insert(id, record);
        Some(id)
    }

    pub fn get(&self, id: SquadId) -> Option<&SquadRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: SquadId) -> Option<&mut SquadRecord> {
        self.records.get_mut(&id)
    }

    /// Removes `member` from its squad, dissolving the squad once empty.
    pub fn leave(&mut self, id: SquadId, member: EntityId) {
        if let Some(record) = self.records.get_mut(&id) {
            record.remove_member(member);
            if record.is_empty() {
                self.records.remove(&id);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SquadRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    fn enemy(index: u32) -> EnemyRef {
        EnemyRef::new(id(index), Vec3::ZERO, Relationship::Hate)
    }

    #[test]
    fn leader_promoted_on_leave() {
        let mut squads = Squads::new();
        let squad = squads
            .form(&[id(1), id(2), id(3)], &SquadConfig::default())
            .unwrap();
        squads.leave(squad, id(1));
        assert_eq!(squads.get(squad).unwrap().leader(), id(2));
        squads.leave(squad, id(2));
        squads.leave(squad, id(3));
        assert!(squads.get(squad).is_none());
    }

    #[test]
    fn slots_are_exclusive() {
        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        record.add_member(id(2));
        record.add_member(id(3));
        assert_eq!(
            record.occupy_slot(id(1), SquadSlots::ATTACK),
            Some(SquadSlots::ATTACK1)
        );
        assert_eq!(
            record.occupy_slot(id(2), SquadSlots::ATTACK),
            Some(SquadSlots::ATTACK2)
        );
        assert_eq!(record.occupy_slot(id(3), SquadSlots::ATTACK), None);
        record.vacate_slot(id(1));
        assert_eq!(
            record.occupy_slot(id(3), SquadSlots::ATTACK),
            Some(SquadSlots::ATTACK1)
        );
    }

    #[test]
    fn eluded_until_fresh_sighting() {
        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        record.report_sighting(enemy(9), 1.);
        record.mark_eluded();
        assert!(record.is_eluded());
        assert!(!record.report_sighting(enemy(9), 0.5));
        assert!(record.is_eluded());
        assert!(record.report_sighting(enemy(9), 2.));
        assert!(!record.is_eluded());
    }

    #[test]
    fn freshest_sighting_wins_in_any_order() {
        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        assert!(record.report_sighting(enemy(8), 2.));
        assert!(!record.report_sighting(enemy(9), 1.));
        assert_eq!(record.last_seen(), Some(2.));
        assert_eq!(record.shared_enemy().map(|e| e.handle), Some(id(8)));

        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        assert!(record.report_sighting(enemy(9), 1.));
        assert!(record.report_sighting(enemy(8), 2.));
        assert_eq!(record.last_seen(), Some(2.));
        assert_eq!(record.shared_enemy().map(|e| e.handle), Some(id(8)));
    }

    #[test]
    fn closer_holder_keeps_its_spot() {
        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        record.add_member(id(2));
        let spot = Vec3::new(300., 20., 0.);
        assert!(record.reserve_position(id(1), spot, 50.));
        // same bucket, slightly off
        assert!(!record.reserve_position(id(2), spot + Vec3::new(4., 4., 0.), 100.));
        assert_eq!(record.holder(spot), Some(id(1)));

        // a closer mate displaces the holder
        assert!(record.reserve_position(id(2), spot, 10.));
        assert_eq!(record.holder(spot), Some(id(2)));
        assert_eq!(record.reserved_by(id(1)).count(), 0);

        record.release_positions(id(2));
        assert_eq!(record.holder(spot), None);
        assert!(record.reserve_position(id(1), spot, 50.));
    }

    #[test]
    fn reservation_table_is_bounded() {
        let config = SquadConfig {
            reservation_capacity: 2,
            ..SquadConfig::default()
        };
        let mut record = SquadRecord::new(SquadId(0), id(1), &config);
        assert!(record.reserve_position(id(1), Vec3::new(0., 0., 0.), 10.));
        assert!(record.reserve_position(id(1), Vec3::new(500., 0., 0.), 10.));
        assert!(!record.reserve_position(id(1), Vec3::new(1000., 0., 0.), 10.));
        record.release_positions(id(1));
        assert!(record.reserve_position(id(1), Vec3::new(1000., 0., 0.), 10.));
    }

    #[test]
    fn speech_gate() {
        let mut record = SquadRecord::new(SquadId(0), id(1), &SquadConfig::default());
        assert!(record.speak(0., true));
        assert!(record.speech.question_pending);
        assert!(!record.speak(1., false));
        assert!(record.speak(3., false));
    }
}
