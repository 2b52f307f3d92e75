//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` so the
//! codec can pack it directly, but callers should prefer `.index()` when
//! addressing the population arenas.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID": the maximum of the inner type.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Dense index of a person.  Resolved back to the external string id
    /// through the provider's person table.
    pub struct PersonId(u32);
}

typed_id! {
    /// Dense index of a container (facility or vehicle).
    pub struct ContainerId(u32);
}

typed_id! {
    /// Index into the run's [`ActivityDictionary`](crate::ActivityDictionary).
    ///
    /// One byte per activity keeps event records small.  `INVALID` (0xFF, or
    /// -1 as a signed byte) marks an absent previous/next activity.
    pub struct ActivityId(u8);
}

impl ActivityId {
    /// Map the `INVALID` sentinel to `None`.
    #[inline]
    pub fn get(self) -> Option<ActivityId> {
        self.is_valid().then_some(self)
    }

    /// Inverse of [`get`](Self::get).
    #[inline]
    pub fn from_option(id: Option<ActivityId>) -> ActivityId {
        id.unwrap_or(ActivityId::INVALID)
    }
}
