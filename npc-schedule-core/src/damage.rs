/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Classification, DamageConfig, EntityId, WaterLevel, WorldQuery};

bitflags! {
    /// The kinds of damage carried by an attack; they decide the death policy.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DamageFlags: u32 {
        const CRUSH = 1 << 0;
        const BULLET = 1 << 1;
        const SLASH = 1 << 2;
        const BURN = 1 << 3;
        const FREEZE = 1 << 4;
        const FALL = 1 << 5;
        const BLAST = 1 << 6;
        const CLUB = 1 << 7;
        const SHOCK = 1 << 8;
        const SONIC = 1 << 9;
        const ENERGY_BEAM = 1 << 10;
        const NEVER_GIB = 1 << 12;
        const ALWAYS_GIB = 1 << 13;
        const DROWN = 1 << 14;
        const PARALYZE = 1 << 15;
        const NERVE_GAS = 1 << 16;
        const POISON = 1 << 17;
        const RADIATION = 1 << 18;
        const ACID = 1 << 21;
    }
}

/// A named body region carrying a damage multiplier.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HitGroup {
    #[default]
    Generic,
    Head,
    Chest,
    Stomach,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

/// Damage multipliers per hit group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HitGroupMultipliers {
    pub head: f32,
    pub chest: f32,
    pub stomach: f32,
    pub arm: f32,
    pub leg: f32,
}
impl Default for HitGroupMultipliers {
    fn default() -> Self {
        Self {
            head: 3.,
            chest: 1.,
            stomach: 1.,
            arm: 1.,
            leg: 1.,
        }
    }
}
impl HitGroupMultipliers {
    pub fn multiplier(&self, hit_group: HitGroup) -> f32 {
        match hit_group {
            HitGroup::Generic => 1.,
            HitGroup::Head => self.head,
            HitGroup::Chest => self.chest,
            HitGroup::Stomach => self.stomach,
            HitGroup::LeftArm | HitGroup::RightArm => self.arm,
            HitGroup::LeftLeg | HitGroup::RightLeg => self.leg,
        }
    }
}

/// Game difficulty.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Damage multipliers per difficulty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SkillScale {
    pub easy: f32,
    pub medium: f32,
    pub hard: f32,
}
impl Default for SkillScale {
    fn default() -> Self {
        Self {
            easy: 0.6,
            medium: 1.,
            hard: 1.5,
        }
    }
}
impl SkillScale {
    pub fn multiplier(&self, skill: SkillLevel) -> f32 {
        match skill {
            SkillLevel::Easy => self.easy,
            SkillLevel::Medium => self.medium,
            SkillLevel::Hard => self.hard,
        }
    }
}

/// Something whose health the damage engine can change.
pub trait Damageable {
    fn health(&self) -> f32;

    fn set_health(&mut self, health: f32);

    /// Whether damage applies at all (e.g. not for invulnerable entities).
    fn takes_damage(&self) -> bool {
        true
    }

    /// Signals non-lethal damage; `flinch` is true if the flinch threshold was reached.
    fn hurt(
        &mut self,
        _attacker: Option<EntityId>,
        _amount: f32,
        _flags: DamageFlags,
        _flinch: bool,
    ) {
    }

    /// Signals death; called at most once per event and only when health crossed zero.
    fn killed(&mut self, attacker: Option<EntityId>, gib: bool, flags: DamageFlags);
}

/// One contribution to a damage event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageContribution {
    pub attacker: Option<EntityId>,
    pub amount: f32,
    pub flags: DamageFlags,
    pub hit_group: HitGroup,
}

/// The result of committing a damage event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// The event was not open, nothing happened.
    Ignored,
    /// Nothing to apply, or the victim could not be damaged.
    Absorbed,
    Hurt { amount: f32, flinch: bool },
    Killed { amount: f32, gib: bool },
}
impl DamageOutcome {
    pub fn is_kill(&self) -> bool {
        matches!(self, DamageOutcome::Killed { .. })
    }
}

/// Accumulates all damage dealt to one victim during one attack resolution.
///
/// The event is closed by a single [commit](Self::commit); later commits are no-ops.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageEvent {
    victim: EntityId,
    contributions: Vec<DamageContribution>,
    committed: bool,
}

impl DamageEvent {
    pub fn begin(victim: EntityId) -> Self {
        Self {
            victim,
            contributions: Vec::new(),
            committed: false,
        }
    }

    pub fn victim(&self) -> EntityId {
        self.victim
    }

    pub fn is_open(&self) -> bool {
        !self.committed
    }

    pub fn contributions(&self) -> &[DamageContribution] {
        &self.contributions
    }

    /// Adds a contribution, returns false if it was dropped (non-positive amount or closed event).
    pub fn add(&mut self, attacker: Option<EntityId>, amount: f32, flags: DamageFlags) -> bool {
        self.add_on(attacker, amount, flags, HitGroup::Generic)
    }

    /// Adds a contribution landing on a given hit group; the amount must already be scaled.
    pub fn add_on(
        &mut self,
        attacker: Option<EntityId>,
        amount: f32,
        flags: DamageFlags,
        hit_group: HitGroup,
    ) -> bool {
        if self.committed {
            log::warn!("Adding damage to already committed event for {}", self.victim);
            return false;
        }
        if amount <= 0. || !amount.is_finite() {
            return false;
        }
        self.contributions.push(DamageContribution {
            attacker,
            amount,
            flags,
            hit_group,
        });
        true
    }

    pub fn total(&self) -> f32 {
        self.contributions.iter().map(|c| c.amount).sum()
    }

    /// Union of the damage flags of all contributions.
    pub fn flags(&self) -> DamageFlags {
        self.contributions
            .iter()
            .fold(DamageFlags::empty(), |flags, c| flags | c.flags)
    }

    /// Applies the summed damage to `victim`, firing at most one death or pain reaction.
    pub fn commit(&mut self, victim: &mut dyn Damageable, config: &DamageConfig) -> DamageOutcome {
        if self.committed {
            log::warn!("Damage event for {} committed twice, ignoring", self.victim);
            return DamageOutcome::Ignored;
        }
        self.committed = true;
        let amount = self.total();
        if amount <= 0. || !victim.takes_damage() || victim.health() <= 0. {
            return DamageOutcome::Absorbed;
        }
        let flags = self.flags();
        let attacker = self.contributions.last().and_then(|c| c.attacker);
        let health = victim.health() - amount;
        victim.set_health(health);
        if health <= 0. {
            let gib = should_gib(flags, health, config.gib_health);
            victim.killed(attacker, gib, flags);
            DamageOutcome::Killed { amount, gib }
        } else {
            let flinch = amount >= config.flinch_threshold;
            victim.hurt(attacker, amount, flags, flinch);
            DamageOutcome::Hurt { amount, flinch }
        }
    }
}

impl fmt::Display for DamageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} takes {} in {} hit(s)",
            self.victim,
            self.total(),
            self.contributions.len()
        )
    }
}

/// Decides between a gibbing and a normal death.
pub fn should_gib(flags: DamageFlags, health: f32, gib_health: f32) -> bool {
    if flags.contains(DamageFlags::ALWAYS_GIB) {
        true
    } else if flags.contains(DamageFlags::NEVER_GIB) {
        false
    } else {
        health < gib_health
    }
}

/// A purely cosmetic reaction to a hit, rendered by an external sink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CosmeticEffect {
    Ricochet { victim: EntityId, point: Vec3 },
}

/// The damage ledger of one attack resolution window.
///
/// Events stay open per victim until taken, so hits on several victims may interleave and
/// still produce one event per victim. [add](MultiDamage::add) targets the event of the last
/// victim passed to [begin](MultiDamage::begin). Taken events are handed to the caller, who
/// commits each of them exactly once.
#[derive(Default)]
pub struct MultiDamage {
    tick: u64,
    /// in order of first hit
    events: Vec<DamageEvent>,
    current: Option<usize>,
    last_cosmetic: FxHashMap<EntityId, u64>,
    effects: Vec<CosmeticEffect>,
}

impl MultiDamage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick used for rate-limiting cosmetic effects.
    pub fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
        self.last_cosmetic.retain(|_, last| *last + 1 >= tick);
    }

    /// Makes `victim` the target of [add](MultiDamage::add), opening its event if needed.
    pub fn begin(&mut self, victim: EntityId) {
        let index = match self.events.iter().position(|event| event.victim() == victim) {
            Some(index) => index,
            None => {
                self.events.push(DamageEvent::begin(victim));
                self.events.len() - 1
            }
        };
        self.current = Some(index);
    }

    /// Adds to the current event, warns and drops the damage if there is none.
    pub fn add(
        &mut self,
        attacker: Option<EntityId>,
        amount: f32,
        flags: DamageFlags,
        hit_group: HitGroup,
    ) -> bool {
        match self.current.and_then(|index| self.events.get_mut(index)) {
            Some(event) => event.add_on(attacker, amount, flags, hit_group),
            None => {
                log::warn!("Adding {amount} damage without an open damage event");
                false
            }
        }
    }

    /// Opens an event for `victim` if needed and adds to it.
    pub fn add_to(
        &mut self,
        victim: EntityId,
        attacker: Option<EntityId>,
        amount: f32,
        flags: DamageFlags,
        hit_group: HitGroup,
    ) -> bool {
        self.begin(victim);
        self.add(attacker, amount, flags, hit_group)
    }

    /// Adds damage against an armored hit group: `armor` is subtracted and, if nothing gets
    /// through, a ricochet is emitted instead, at most once per tick per victim.
    #[allow(clippy::too_many_arguments)]
    pub fn add_armored(
        &mut self,
        victim: EntityId,
        attacker: Option<EntityId>,
        amount: f32,
        flags: DamageFlags,
        hit_group: HitGroup,
        armor: f32,
        point: Vec3,
    ) -> bool {
        let through = amount - armor;
        if through <= 0. {
            self.ricochet(victim, point);
            return false;
        }
        self.add_to(victim, attacker, through, flags, hit_group)
    }

    /// Emits a ricochet on `victim` unless one was already emitted this tick.
    pub fn ricochet(&mut self, victim: EntityId, point: Vec3) -> bool {
        if self.last_cosmetic.get(&victim) == Some(&self.tick) {
            return false;
        }
        self.last_cosmetic.insert(victim, self.tick);
        self.effects.push(CosmeticEffect::Ricochet { victim, point });
        true
    }

    /// Ends the current target; further [add](MultiDamage::add)s need a new
    /// [begin](MultiDamage::begin). Events stay pending until taken.
    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn has_open_event(&self) -> bool {
        self.current.is_some()
    }

    /// Returns all events pending commit, one per victim; empty events are discarded.
    pub fn take_events(&mut self) -> Vec<DamageEvent> {
        self.current = None;
        let mut events = std::mem::take(&mut self.events);
        events.retain(|event| !event.contributions.is_empty());
        events
    }

    pub fn take_effects(&mut self) -> Vec<CosmeticEffect> {
        std::mem::take(&mut self.effects)
    }
}

/// Linear falloff of area damage: full at the center, zero at and beyond `radius`.
pub fn adjusted_damage(full: f32, radius: f32, distance: f32) -> f32 {
    if distance <= 0. {
        return full.max(0.);
    }
    if radius <= 0. {
        return 0.;
    }
    (full - distance.max(0.) * (full / radius)).max(0.)
}

/// An area-of-effect attack.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiusDamage {
    pub origin: Vec3,
    pub inflictor: Option<EntityId>,
    pub attacker: Option<EntityId>,
    pub damage: f32,
    pub radius: f32,
    pub flags: DamageFlags,
    /// entities of this class are spared
    pub ignore: Option<Classification>,
}

impl RadiusDamage {
    /// Opens one damage event per eligible entity, returns how many were hit.
    ///
    /// An entity is eligible if it takes damage, is not on the other side of a water
    /// surface from the origin, and a straight line from the origin reaches it.
    pub fn apply(&self, world: &dyn WorldQuery, ledger: &mut MultiDamage) -> usize {
        let origin_in_water = world.is_underwater(self.origin);
        let mut hits = 0;
        for id in world.entities_in_sphere(self.origin, self.radius) {
            let Some(info) = world.entity(id) else {
                continue;
            };
            if !info.alive || !info.takes_damage {
                continue;
            }
            if self.ignore == Some(info.classification) {
                continue;
            }
            if origin_in_water && info.water_level == WaterLevel::Dry {
                continue;
            }
            if !origin_in_water && info.water_level == WaterLevel::Eyes {
                continue;
            }
            let target = info.body_target();
            let trace = world.trace_line(self.origin, target, self.inflictor);
            if !trace.is_clear() && trace.hit_entity != Some(id) {
                continue;
            }
            let distance = self.origin.distance(target);
            let amount = adjusted_damage(self.damage, self.radius, distance);
            if ledger.add_to(id, self.attacker, amount, self.flags, HitGroup::Generic) {
                hits += 1;
            }
        }
        ledger.close();
        hits
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    struct Dummy {
        health: f32,
        deaths: u32,
        gibbed: bool,
        flinches: u32,
    }
    impl Dummy {
        fn new(health: f32) -> Self {
            Self {
                health,
                deaths: 0,
                gibbed: false,
                flinches: 0,
            }
        }
    }
    impl Damageable for Dummy {
        fn health(&self) -> f32 {
            self.health
        }
        fn set_health(&mut self, health: f32) {
            self.health = health;
        }
        fn hurt(&mut self, _: Option<EntityId>, _: f32, _: DamageFlags, flinch: bool) {
            if flinch {
                self.flinches += 1;
            }
        }
        fn killed(&mut self, _: Option<EntityId>, gib: bool, _: DamageFlags) {
            self.deaths += 1;
            self.gibbed = gib;
        }
    }

    const VICTIM: EntityId = EntityId::new(1, 0);
    const ATTACKER: EntityId = EntityId::new(2, 0);

    #[test]
    fn contributions_summed_once() {
        let config = DamageConfig::default();
        let mut dummy = Dummy::new(100.);
        let mut event = DamageEvent::begin(VICTIM);
        event.add(Some(ATTACKER), 8., DamageFlags::BULLET);
        event.add(Some(ATTACKER), 8., DamageFlags::BULLET);
        assert!(!event.add(Some(ATTACKER), 0., DamageFlags::BULLET));
        let outcome = event.commit(&mut dummy, &config);
        assert_eq!(
            outcome,
            DamageOutcome::Hurt {
                amount: 16.,
                flinch: false
            }
        );
        assert_eq!(event.commit(&mut dummy, &config), DamageOutcome::Ignored);
        assert_eq!(dummy.health, 84.);
    }

    #[test]
    fn zero_damage_has_no_reaction() {
        let mut dummy = Dummy::new(10.);
        let mut event = DamageEvent::begin(VICTIM);
        event.add(None, 0., DamageFlags::CLUB);
        assert_eq!(
            event.commit(&mut dummy, &DamageConfig::default()),
            DamageOutcome::Absorbed
        );
        assert_eq!(dummy.flinches, 0);
    }

    #[test]
    fn flinch_above_threshold() {
        let mut dummy = Dummy::new(100.);
        let mut event = DamageEvent::begin(VICTIM);
        event.add(None, 25., DamageFlags::SLASH);
        let outcome = event.commit(&mut dummy, &DamageConfig::default());
        assert_eq!(
            outcome,
            DamageOutcome::Hurt {
                amount: 25.,
                flinch: true
            }
        );
        assert_eq!(dummy.flinches, 1);
    }

    #[test]
    fn gib_policy() {
        assert!(should_gib(
            DamageFlags::ALWAYS_GIB | DamageFlags::NEVER_GIB,
            -1.,
            -30.
        ));
        assert!(!should_gib(DamageFlags::NEVER_GIB, -100., -30.));
        assert!(should_gib(DamageFlags::BLAST, -31., -30.));
        assert!(!should_gib(DamageFlags::BULLET, -10., -30.));
    }

    #[test]
    fn dead_victim_not_killed_again() {
        let config = DamageConfig::default();
        let mut dummy = Dummy::new(5.);
        let mut first = DamageEvent::begin(VICTIM);
        first.add(None, 10., DamageFlags::BULLET);
        assert!(first.commit(&mut dummy, &config).is_kill());
        let mut second = DamageEvent::begin(VICTIM);
        second.add(None, 10., DamageFlags::BULLET);
        assert_eq!(second.commit(&mut dummy, &config), DamageOutcome::Absorbed);
        assert_eq!(dummy.deaths, 1);
    }

    #[test]
    fn ledger_switches_victims() {
        let mut ledger = MultiDamage::new();
        assert!(!ledger.add(None, 5., DamageFlags::BULLET, HitGroup::Chest));
        ledger.add_to(VICTIM, None, 5., DamageFlags::BULLET, HitGroup::Chest);
        ledger.add_to(VICTIM, None, 5., DamageFlags::BULLET, HitGroup::Head);
        ledger.add_to(ATTACKER, None, 3., DamageFlags::BULLET, HitGroup::Chest);
        let events = ledger.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].victim(), VICTIM);
        assert_eq!(events[0].total(), 10.);
        assert_eq!(events[1].total(), 3.);
        assert!(!ledger.has_open_event());
    }

    #[test]
    fn interleaved_victims_share_one_event_each() {
        let config = DamageConfig::default();
        let mut ledger = MultiDamage::new();
        ledger.add_to(VICTIM, None, 15., DamageFlags::BULLET, HitGroup::Chest);
        ledger.add_to(ATTACKER, None, 15., DamageFlags::BULLET, HitGroup::Chest);
        ledger.add_to(VICTIM, None, 15., DamageFlags::BULLET, HitGroup::Chest);
        let mut events = ledger.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].victim(), VICTIM);
        assert_eq!(events[0].total(), 30.);
        assert_eq!(events[1].victim(), ATTACKER);
        assert_eq!(events[1].total(), 15.);

        let mut dummy = Dummy::new(100.);
        assert_eq!(
            events[0].commit(&mut dummy, &config),
            DamageOutcome::Hurt {
                amount: 30.,
                flinch: true
            }
        );
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn ricochet_rate_limited_per_tick() {
        let mut ledger = MultiDamage::new();
        ledger.begin_tick(7);
        for _ in 0..3 {
            ledger.add_armored(
                VICTIM,
                None,
                10.,
                DamageFlags::BULLET,
                HitGroup::Head,
                20.,
                glam::Vec3::ZERO,
            );
        }
        assert_eq!(ledger.take_effects().len(), 1);
        assert!(ledger.take_events().is_empty());
        ledger.begin_tick(8);
        assert!(ledger.ricochet(VICTIM, glam::Vec3::ZERO));
    }

    #[test]
    fn falloff_bounds() {
        assert_eq!(adjusted_damage(100., 250., 0.), 100.);
        assert_eq!(adjusted_damage(100., 250., 125.), 50.);
        assert_eq!(adjusted_damage(100., 250., 250.), 0.);
        assert_eq!(adjusted_damage(100., 250., 400.), 0.);
        assert_eq!(adjusted_damage(100., 0., 0.), 100.);
        assert_eq!(adjusted_damage(100., 0., 10.), 0.);
    }
}
