/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{Conditions, EntityId};

bitflags! {
    /// The categories of broadcast sounds an agent may react to.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SoundClass: u8 {
        const COMBAT = 1 << 0;
        const WORLD = 1 << 1;
        const PLAYER = 1 << 2;
        const DANGER = 1 << 3;
    }
}

impl SoundClass {
    /// The condition bits set when hearing sounds of this class.
    pub fn conditions(self) -> Conditions {
        let mut conditions = Conditions::empty();
        if self.contains(SoundClass::COMBAT) {
            conditions |= Conditions::HEAR_COMBAT;
        }
        if self.contains(SoundClass::WORLD) {
            conditions |= Conditions::HEAR_WORLD;
        }
        if self.contains(SoundClass::PLAYER) {
            conditions |= Conditions::HEAR_PLAYER;
        }
        if self.contains(SoundClass::DANGER) {
            conditions |= Conditions::HEAR_DANGER;
        }
        conditions
    }
}

/// A sound broadcast by the world, audible within its radius until it expires.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SoundEvent {
    pub position: Vec3,
    pub radius: f32,
    pub class: SoundClass,
    pub expires: f32,
    pub emitter: Option<EntityId>,
}
impl SoundEvent {
    /// Returns whether a listener at `listener` with the given sensitivity hears this sound at `time`.
    pub fn audible_from(&self, listener: Vec3, sensitivity: f32, time: f32) -> bool {
        time <= self.expires && listener.distance(self.position) <= self.radius * sensitivity
    }
}

/// What an agent heard during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hearing {
    /// union of the classes of all heard sounds
    pub classes: SoundClass,
    /// the most pressing heard sound: danger first, then the nearest
    pub best: Option<SoundEvent>,
}

/// Collects the sounds audible from `listener` whose class intersects `mask`.
pub fn listen(
    listener: Vec3,
    sensitivity: f32,
    mask: SoundClass,
    sounds: &[SoundEvent],
    time: f32,
) -> Hearing {
    let mut hearing = Hearing::default();
    for sound in sounds
        .iter()
        .filter(|sound| sound.class.intersects(mask))
        .filter(|sound| sound.audible_from(listener, sensitivity, time))
    {
        hearing.classes |= sound.class;
        let better = match &hearing.best {
            None => true,
            Some(best) => {
                let danger = sound.class.contains(SoundClass::DANGER);
                let best_danger = best.class.contains(SoundClass::DANGER);
                (danger && !best_danger)
                    || (danger == best_danger
                        && listener.distance(sound.position) < listener.distance(best.position))
            }
        };
        if better {
            hearing.best = Some(*sound);
        }
    }
    hearing
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::*;

    fn sound(x: f32, class: SoundClass) -> SoundEvent {
        SoundEvent {
            position: Vec3::new(x, 0., 0.),
            radius: 500.,
            class,
            expires: 10.,
            emitter: None,
        }
    }

    #[test]
    fn danger_preferred_over_nearer_sound() {
        let sounds = [sound(10., SoundClass::COMBAT), sound(300., SoundClass::DANGER)];
        let hearing = listen(Vec3::ZERO, 1., SoundClass::all(), &sounds, 0.);
        assert_eq!(hearing.classes, SoundClass::COMBAT | SoundClass::DANGER);
        assert_eq!(hearing.best.unwrap().class, SoundClass::DANGER);
    }

    #[test]
    fn mask_and_expiry_filter() {
        let sounds = [sound(10., SoundClass::WORLD)];
        assert!(listen(Vec3::ZERO, 1., SoundClass::COMBAT, &sounds, 0.)
            .best
            .is_none());
        assert!(listen(Vec3::ZERO, 1., SoundClass::all(), &sounds, 11.)
            .best
            .is_none());
        assert!(listen(Vec3::new(600., 0., 0.), 1., SoundClass::all(), &sounds, 0.)
            .best
            .is_none());
    }

    #[test]
    fn classes_map_to_conditions() {
        let conditions = (SoundClass::DANGER | SoundClass::PLAYER).conditions();
        assert_eq!(conditions, Conditions::HEAR_DANGER | Conditions::HEAR_PLAYER);
    }
}
