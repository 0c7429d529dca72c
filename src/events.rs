//! Outbound events for renderer/audio/camera collaborators.
//!
//! The controller never knows who listens: collaborators subscribe with
//! `EventReader` for as long as they live and read the events on their own
//! cadence.

use bevy::prelude::*;

/// Sent once per hit-state entry, on the step the knockback impulse was
/// applied.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitStateEntered {
    /// The character that was hit.
    pub entity: Entity,
}

/// Sent on the rising edge of the hat button. Pure pass-through for
/// cosmetic collaborators; the state machine ignores it.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatTriggered {
    /// The character whose hat button was pressed.
    pub entity: Entity,
}
