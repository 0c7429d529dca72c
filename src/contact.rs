//! Contact data and the per-step surface classification.
//!
//! The physics backend refills a [`ContactBuffer`] every fixed step with the
//! character's current rigid-body contacts. [`ContactSet::classify`] then
//! buckets them into at most one ground, one wall, and one ceiling contact
//! using a single normal-projection pass.

use bevy::prelude::*;

/// A single rigid-body contact against a walkable surface.
///
/// Ephemeral: recomputed every physics step, never carried over.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceContact {
    /// World-space contact point.
    pub point: Vec2,
    /// Unit surface normal, pointing away from the surface into free space.
    pub normal: Vec2,
}

impl SurfaceContact {
    /// Create a new surface contact.
    pub fn new(point: Vec2, normal: Vec2) -> Self {
        Self { point, normal }
    }
}

/// A current contact against an enemy-layer body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct EnemyContact {
    /// World-space position of the enemy body, used for the knockback
    /// direction.
    pub body_position: Vec2,
    /// True only on the step the contact began. Persisting contacts keep
    /// re-triggering the hit state from Movement but not from within Hit.
    pub started: bool,
}

impl EnemyContact {
    /// A contact that began this step.
    pub fn began(body_position: Vec2) -> Self {
        Self {
            body_position,
            started: true,
        }
    }

    /// A contact carried over from a previous step.
    pub fn persisting(body_position: Vec2) -> Self {
        Self {
            body_position,
            started: false,
        }
    }
}

/// Collision-group filter for contact harvesting.
///
/// Bodies whose group memberships intersect `ground` feed the surface
/// classifier; bodies intersecting `enemy` trigger the hit state. The bit
/// layout follows the backend's collision groups (for Rapier,
/// `Group::bits()`).
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ContactLayers {
    /// Memberships considered walkable surfaces.
    pub ground: u32,
    /// Memberships considered enemies.
    pub enemy: u32,
}

impl Default for ContactLayers {
    fn default() -> Self {
        // Everything is walkable, nothing is hostile.
        Self {
            ground: u32::MAX,
            enemy: 0,
        }
    }
}

impl ContactLayers {
    /// Create a filter from ground and enemy membership masks.
    pub fn new(ground: u32, enemy: u32) -> Self {
        Self { ground, enemy }
    }
}

/// Per-step contact feed, filled by the physics backend before the
/// controller steps.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct ContactBuffer {
    /// Contacts against ground-layer bodies.
    pub surfaces: Vec<SurfaceContact>,
    /// Contacts against enemy-layer bodies.
    pub enemies: Vec<EnemyContact>,
}

impl ContactBuffer {
    /// Clear both lists at the start of a gather pass.
    pub fn begin_step(&mut self) {
        self.surfaces.clear();
        self.enemies.clear();
    }
}

/// The classified contacts of one physics step: at most one contact per
/// class.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactSet {
    /// Best ground contact (normal projection onto up above the walk
    /// threshold).
    pub ground: Option<SurfaceContact>,
    /// Best wall contact (projection in `[0, walk threshold]`).
    pub wall: Option<SurfaceContact>,
    /// Best ceiling contact (projection below the negated walk threshold).
    pub ceiling: Option<SurfaceContact>,
}

impl ContactSet {
    /// Classify `contacts` in one pass.
    ///
    /// `max_walk_cos` is the cosine of the steepest walkable slope. For each
    /// contact the projection `p = up · normal` decides the class:
    /// `p > max_walk_cos` is ground, `p < -max_walk_cos` is ceiling, and
    /// `0 <= p <= max_walk_cos` is wall. Within a class the contact with the
    /// best projection wins, so steep-but-walkable slopes lose to flatter
    /// ground when both are touching.
    pub fn classify(contacts: &[SurfaceContact], max_walk_cos: f32) -> Self {
        let mut set = Self::default();
        let mut ground_projection = max_walk_cos;
        let mut wall_projection = max_walk_cos;
        let mut ceiling_projection = -max_walk_cos;

        for contact in contacts {
            let projection = Vec2::Y.dot(contact.normal);

            if projection > ground_projection {
                set.ground = Some(*contact);
                ground_projection = projection;
            } else if projection < ceiling_projection {
                set.ceiling = Some(*contact);
                ceiling_projection = projection;
            } else if projection <= wall_projection && projection >= 0.0 {
                set.wall = Some(*contact);
                wall_projection = projection;
            }
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_WALK_COS: f32 = 0.5;

    fn contact(normal: Vec2) -> SurfaceContact {
        SurfaceContact::new(Vec2::ZERO, normal)
    }

    #[test]
    fn empty_input_yields_empty_set() {
        let set = ContactSet::classify(&[], MAX_WALK_COS);
        assert_eq!(set, ContactSet::default());
    }

    #[test]
    fn flat_ground_is_ground() {
        let set = ContactSet::classify(&[contact(Vec2::Y)], MAX_WALK_COS);
        assert!(set.ground.is_some());
        assert!(set.wall.is_none());
        assert!(set.ceiling.is_none());
    }

    #[test]
    fn vertical_surface_is_wall() {
        let set = ContactSet::classify(&[contact(Vec2::NEG_X)], MAX_WALK_COS);
        assert!(set.ground.is_none());
        assert!(set.wall.is_some());
    }

    #[test]
    fn overhang_below_negative_threshold_is_not_wall() {
        // Projection in (-max_walk_cos, 0): steep overhang. The refined rule
        // rejects it from the wall class instead of letting the character
        // push against it.
        let normal = Vec2::new(0.98, -0.2).normalize();
        let set = ContactSet::classify(&[contact(normal)], MAX_WALK_COS);
        assert!(set.ground.is_none());
        assert!(set.wall.is_none());
        assert!(set.ceiling.is_none());
    }

    #[test]
    fn downward_normal_is_ceiling() {
        let set = ContactSet::classify(&[contact(Vec2::NEG_Y)], MAX_WALK_COS);
        assert!(set.ceiling.is_some());
        assert!(set.ground.is_none());
        assert!(set.wall.is_none());
    }

    #[test]
    fn threshold_projection_is_wall_not_ground() {
        // Exactly at the walk threshold: the ground test is strict.
        let normal = Vec2::new((1.0f32 - 0.25).sqrt(), 0.5);
        let set = ContactSet::classify(&[contact(normal)], MAX_WALK_COS);
        assert!(set.ground.is_none());
        assert!(set.wall.is_some());
    }

    #[test]
    fn best_ground_projection_wins() {
        let slope = contact(Vec2::new(0.6, 0.8));
        let flat = contact(Vec2::Y);
        let set = ContactSet::classify(&[slope, flat], MAX_WALK_COS);
        assert_eq!(set.ground, Some(flat));

        // Order-independent for strictly better projections.
        let set = ContactSet::classify(&[flat, slope], MAX_WALK_COS);
        assert_eq!(set.ground, Some(flat));
    }

    #[test]
    fn each_contact_lands_in_at_most_one_class() {
        let contacts = [
            contact(Vec2::Y),
            contact(Vec2::X),
            contact(Vec2::NEG_Y),
            contact(Vec2::new(0.6, 0.8)),
        ];
        let set = ContactSet::classify(&contacts, MAX_WALK_COS);
        let ground = set.ground.unwrap();
        let wall = set.wall.unwrap();
        let ceiling = set.ceiling.unwrap();
        assert_ne!(ground.normal, wall.normal);
        assert_ne!(ground.normal, ceiling.normal);
        assert_ne!(wall.normal, ceiling.normal);
    }

    #[test]
    fn classification_is_idempotent() {
        let contacts = [
            contact(Vec2::new(0.6, 0.8)),
            contact(Vec2::X),
            contact(Vec2::NEG_Y),
        ];
        let first = ContactSet::classify(&contacts, MAX_WALK_COS);
        let second = ContactSet::classify(&contacts, MAX_WALK_COS);
        assert_eq!(first, second);
    }

    #[test]
    fn buffer_begin_step_clears_both_lists() {
        let mut buffer = ContactBuffer::default();
        buffer.surfaces.push(contact(Vec2::Y));
        buffer.enemies.push(EnemyContact::began(Vec2::X));
        buffer.begin_step();
        assert!(buffer.surfaces.is_empty());
        assert!(buffer.enemies.is_empty());
    }
}
