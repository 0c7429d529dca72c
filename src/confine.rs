//! Axis-aligned rectangle clamp.
//!
//! Used by camera-follow collaborators to keep a framed point inside level
//! bounds; kept here because it is pure and shared.

use bevy::prelude::*;

/// Clamp `point` so that the box `point ± half_extent` stays inside
/// `[min, max]`, independently per axis.
///
/// An axis that already fits is left untouched. When the box is wider than
/// the allowed range on an axis, the `min` side wins.
pub fn confine_point(point: Vec2, min: Vec2, max: Vec2, half_extent: Vec2) -> Vec2 {
    let low = point - half_extent;
    let high = point + half_extent;
    let mut confined = point;

    if low.x < min.x {
        confined.x = min.x + half_extent.x;
    } else if high.x > max.x {
        confined.x = max.x - half_extent.x;
    }

    if low.y < min.y {
        confined.y = min.y + half_extent.y;
    } else if high.y > max.y {
        confined.y = max.y - half_extent.y;
    }

    confined
}
