//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the kernel has a strongly-typed ID so the compiler
//! rejects accidental mixing (passing a `StructureId` where a `TileId`'s
//! owner `WorldId` was expected, etc). IDs use UUID v7 (time-ordered) so
//! they sort roughly by creation order and index well in the relational
//! store.
//!
//! `spec.md` §3 only requires identifiers be "string"; the display/`Serialize`
//! impl here renders as the UUID's canonical string form, so any consumer
//! treating IDs as opaque strings sees exactly that.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with the kernel's standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a [`crate::structs::World`].
    WorldId
}

define_id! {
    /// Unique identifier for a [`crate::structs::Region`].
    RegionId
}

define_id! {
    /// Unique identifier for a [`crate::structs::Structure`].
    StructureId
}

define_id! {
    /// Unique identifier for a river segment.
    RiverSegmentId
}

define_id! {
    /// Unique identifier for a [`crate::structs::Character`] (player or NPC).
    CharacterId
}

define_id! {
    /// Unique identifier for a [`crate::structs::Participant`] inside an encounter.
    ParticipantId
}

define_id! {
    /// Unique identifier for a [`crate::structs::CombatState`] encounter.
    EncounterId
}

define_id! {
    /// Unique identifier for a [`crate::structs::Condition`] instance.
    ConditionId
}

define_id! {
    /// Unique identifier for an [`crate::structs::Aura`].
    AuraId
}

define_id! {
    /// Unique identifier for an [`crate::structs::AuditEntry`].
    AuditEntryId
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let world = WorldId::new();
        let region = RegionId::new();
        assert_ne!(world.into_inner(), Uuid::nil());
        assert_ne!(region.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = EncounterId::new();
        let json = serde_json::to_string(&original).expect("id must serialize");
        let restored: EncounterId = serde_json::from_str(&json).expect("id must deserialize");
        assert_eq!(original, restored);
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = CharacterId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
