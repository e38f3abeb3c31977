//! # Physical Components
//!
//! Plain-data state every entity record carries, stored densely per slot.

use bytemuck::{Pod, Zeroable};

use crate::math::Vec3;

/// Marker trait for densely stored components.
///
/// Components are plain old data so a whole storage can be reset or copied
/// without running any destructors.
pub trait Component: Copy + Pod + Zeroable + Default + 'static {
    /// Short name, used in log output.
    const NAME: &'static str;
}

/// Position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position(pub Vec3);

impl Component for Position {
    const NAME: &'static str = "position";
}

/// Motion (velocity per tick).
///
/// Pushes add to this; the native tick integrates it into [`Position`] and
/// then applies drag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Motion(pub Vec3);

impl Component for Motion {
    const NAME: &'static str = "motion";
}

/// Facing, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rotation {
    /// Yaw in degrees, 0 = +Z.
    pub yaw: f32,
    /// Pitch in degrees, positive looks down.
    pub pitch: f32,
}

impl Component for Rotation {
    const NAME: &'static str = "rotation";
}

/// Health and burning state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vitals {
    /// Remaining health points.
    pub health: f32,
    /// Ticks left on fire; 0 when not burning.
    pub fire_ticks: u32,
}

impl Component for Vitals {
    const NAME: &'static str = "vitals";
}

impl Vitals {
    /// Full health, not burning.
    #[must_use]
    pub const fn with_health(health: f32) -> Self {
        Self {
            health,
            fire_ticks: 0,
        }
    }

    /// Whether the entity is currently burning.
    #[must_use]
    pub const fn is_burning(self) -> bool {
        self.fire_ticks > 0
    }
}
