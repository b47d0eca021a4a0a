/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned box.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A box centered on `center` with the given half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns this box grown by `half_extents` on every side (Minkowski sum with a box).
    pub fn expanded(&self, half_extents: Vec3) -> Self {
        Self {
            min: self.min - half_extents,
            max: self.max + half_extents,
        }
    }

    /// Intersects the segment from `start` to `end` with this box, using the slab method.
    ///
    /// Returns the fraction along the segment of the entry point and the normal of the face hit,
    /// or `None` if the segment misses. A segment starting inside hits at fraction 0.
    pub fn segment_hit(&self, start: Vec3, end: Vec3) -> Option<(f32, Vec3)> {
        let delta = end - start;
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;
        let mut normal = Vec3::ZERO;
        for axis in 0..3 {
            let (s, d, lo, hi) = (start[axis], delta[axis], self.min[axis], self.max[axis]);
            if d.abs() < f32::EPSILON {
                if s < lo || s > hi {
                    return None;
                }
                continue;
            }
            let inv = 1. / d;
            let (mut t0, mut t1) = ((lo - s) * inv, (hi - s) * inv);
            let mut sign = -1.;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                sign = 1.;
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = Vec3::ZERO;
                normal[axis] = sign;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }
        Some((t_enter, normal))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::*;

    #[test]
    fn segment_through_box() {
        let wall = Aabb::new(Vec3::new(10., -5., -5.), Vec3::new(12., 5., 5.));
        let (fraction, normal) = wall
            .segment_hit(Vec3::ZERO, Vec3::new(20., 0., 0.))
            .unwrap();
        assert_eq!(fraction, 0.5);
        assert_eq!(normal, Vec3::new(-1., 0., 0.));
        assert!(wall
            .segment_hit(Vec3::ZERO, Vec3::new(5., 0., 0.))
            .is_none());
        assert!(wall
            .segment_hit(Vec3::new(0., 10., 0.), Vec3::new(20., 10., 0.))
            .is_none());
    }

    #[test]
    fn expanded_box_catches_hull() {
        let wall = Aabb::new(Vec3::new(10., -5., -5.), Vec3::new(12., 5., 5.));
        let path = (Vec3::new(0., 15., 0.), Vec3::new(20., 15., 0.));
        assert!(wall.segment_hit(path.0, path.1).is_none());
        assert!(wall
            .expanded(Vec3::splat(16.))
            .segment_hit(path.0, path.1)
            .is_some());
        assert!(wall.contains(wall.center()));
    }
}
