// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometric predicates. Coordinates are ordinary finite-precision
//! reals; every predicate degenerates at distances below [`EPSILON`].

use glam::DVec2;

pub const EPSILON: f64 = 1e-6;

/// Twice the signed area of the triangle `(a, b, c)`. Positive when the three
/// points wind counter-clockwise.
pub fn area2(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Whether `p` lies strictly to the left of the directed line `a -> b`.
pub fn is_left(a: DVec2, b: DVec2, p: DVec2) -> bool {
    area2(a, b, p) > 0.0
}

pub fn is_collinear(a: DVec2, b: DVec2, c: DVec2) -> bool {
    area2(a, b, c).abs() < EPSILON
}

/// Whether the segments `p0 -> p1` and `q0 -> q1` have parallel directions.
pub fn parallel(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2) -> bool {
    (p0 - p1).perp_dot(q0 - q1).abs() < EPSILON
}

/// Whether `p` lies strictly inside the open bounding box of `a` and `b`,
/// on both axes at once.
pub fn in_range(p: DVec2, a: DVec2, b: DVec2) -> bool {
    a.x.min(b.x) < p.x && p.x < a.x.max(b.x) && a.y.min(b.y) < p.y && p.y < a.y.max(b.y)
}

/// Proper intersection test: the endpoints of each segment must lie on
/// opposite sides of the other's supporting line.
pub fn segments_intersect(p0: DVec2, p1: DVec2, q0: DVec2, q1: DVec2) -> bool {
    is_left(p0, p1, q0) != is_left(p0, p1, q1) && is_left(q0, q1, p0) != is_left(q0, q1, p1)
}
