//! # Entity Identity
//!
//! Entity ids are generational slot handles; entity kinds name the host's
//! native entity types.

use std::fmt;

/// Unique identifier for an entity record.
///
/// - Lower 32 bits: slot index into the world's dense arrays
/// - Upper 32 bits: generation, bumped every time the slot is reused
///
/// A stale id (its slot was despawned and reused) never resolves to the new
/// occupant because the generations differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Packs a slot index and generation into an id.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index of this id.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation of this id.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index(), self.generation())
    }
}

/// Native entity types known to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Human player. Listed in the roster, can sleep.
    Player,
    /// Pig. Saddleable; turns into a zombified pig when struck by lightning.
    Pig,
    /// Cow.
    Cow,
    /// Sheep.
    Sheep,
    /// Villager.
    Villager,
    /// Zombie. Hunts the nearest player.
    Zombie,
    /// What a pig becomes after a lightning strike.
    ZombifiedPig,
}

impl EntityKind {
    /// Every kind, in declaration order (the order name matching walks).
    pub const ALL: [Self; 7] = [
        Self::Player,
        Self::Pig,
        Self::Cow,
        Self::Sheep,
        Self::Villager,
        Self::Zombie,
        Self::ZombifiedPig,
    ];

    /// Canonical upper-snake name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "PLAYER",
            Self::Pig => "PIG",
            Self::Cow => "COW",
            Self::Sheep => "SHEEP",
            Self::Villager => "VILLAGER",
            Self::Zombie => "ZOMBIE",
            Self::ZombifiedPig => "ZOMBIFIED_PIG",
        }
    }

    /// Health a freshly spawned entity of this kind starts with.
    #[must_use]
    pub const fn max_health(self) -> f32 {
        match self {
            Self::Player | Self::Villager | Self::Zombie | Self::ZombifiedPig => 20.0,
            Self::Pig | Self::Cow => 10.0,
            Self::Sheep => 8.0,
        }
    }

    /// Whether this kind takes part in the host's sleep check.
    #[must_use]
    pub const fn can_sleep(self) -> bool {
        matches!(self, Self::Player)
    }

    /// Loosely resolves a user-supplied name to a kind.
    ///
    /// A candidate matches when the input equals its name ignoring case, or
    /// equals it with underscores removed or replaced by `-` or a space, or
    /// when its name starts with the input. The first match in [`Self::ALL`]
    /// order wins.
    #[must_use]
    pub fn match_name(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let upper = input.to_ascii_uppercase();
        Self::ALL.into_iter().find(|kind| {
            let name = kind.name();
            name.eq_ignore_ascii_case(input)
                || name.replace('_', "").eq_ignore_ascii_case(input)
                || name.replace('_', "-").eq_ignore_ascii_case(input)
                || name.replace('_', " ").eq_ignore_ascii_case(input)
                || name.starts_with(&upper)
        })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
