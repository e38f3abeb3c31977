//! # Entity Utilities
//!
//! Small helpers around facing and chat-style names.

use marionette_core::native::look_angles;
use marionette_core::{EntityId, World};

/// Section sign that starts a formatting code.
pub const COLOR_CHAR: char = '\u{a7}';

/// Codes recognised after `&`.
const COLOR_CODES: &str = "0123456789abcdefklmnor";

/// Turns `from` to look at `at`.
///
/// Returns `false` if either entity is gone or both share a horizontal
/// position (no direction to face).
pub fn face_entity(world: &mut World, from: EntityId, at: EntityId) -> bool {
    let (Some(origin), Some(target)) = (world.position(from), world.position(at)) else {
        return false;
    };
    let dx = target.x - origin.x;
    let dz = target.z - origin.z;
    if dx * dx + dz * dz < f64::EPSILON {
        return false;
    }
    let (yaw, pitch) = look_angles(origin, target);
    assume_pose(world, from, yaw, pitch)
}

/// Sets the entity's facing directly.
pub fn assume_pose(world: &mut World, id: EntityId, yaw: f32, pitch: f32) -> bool {
    world.set_rotation(id, yaw, pitch)
}

/// Replaces `&x` colour codes with their section-sign form.
///
/// Only valid codes are translated; any other `&` is kept as is.
#[must_use]
pub fn parse_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if let Some(&code) = chars.peek() {
                let lower = code.to_ascii_lowercase();
                if COLOR_CODES.contains(lower) {
                    out.push(COLOR_CHAR);
                    out.push(lower);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
