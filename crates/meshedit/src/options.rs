//! Typed option sets for tracking objects and casting rays.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};

macro_rules! option_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$flag_meta:meta])* const $flag:ident = $bit:expr; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u8);

        impl $name {
            $( $(#[$flag_meta])* pub const $flag: Self = Self(1 << $bit); )+

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn all() -> Self {
                Self(0 $( | (1 << $bit) )+)
            }

            pub const fn bits(self) -> u8 {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 & !rhs.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut names = Vec::new();
                $( if self.contains(Self::$flag) { names.push(stringify!($flag)); } )+
                write!(f, "{}({})", stringify!($name), names.join(" | "))
            }
        }
    };
}

option_set! {
    /// How `add_object` tracks an object.
    ///
    /// `VISIBLE_ONLY` and `SKIP_HIDDEN` become the object's default cast
    /// filters and require `RAY_CAST_ENABLED`; `add_object` drops them from
    /// options without it (see [`TrackOptions::normalized`]).
    /// `WORKING_COPY_ENABLED` combines with anything.
    pub struct TrackOptions {
        /// Build a ray structure so the object can be hit by casts
        const RAY_CAST_ENABLED = 0;
        /// Edit the host's live working copy instead of the persisted mesh
        const WORKING_COPY_ENABLED = 1;
        /// Only hit the object while the host shows it
        const VISIBLE_ONLY = 2;
        /// Never hit hidden elements
        const SKIP_HIDDEN = 3;
    }
}

option_set! {
    /// Filters for a single pointer cast.
    ///
    /// Every flag combination is valid. All of them, `CHECK_OBSTRUCTIONS`
    /// included, only act on objects tracked with
    /// `TrackOptions::RAY_CAST_ENABLED`: casts never target anything else,
    /// and obstructions are tested against those same ray structures plus
    /// the host's untracked geometry. `SPECIFIED_SUBSET_ONLY` without a
    /// specified set narrows nothing.
    pub struct CastOptions {
        const VISIBLE_ONLY = 0;
        const SKIP_HIDDEN = 1;
        /// Restrict to the set given to `set_specified_objects`
        const SPECIFIED_SUBSET_ONLY = 2;
        /// Reject candidates hidden behind nearer, different geometry
        const CHECK_OBSTRUCTIONS = 3;
    }
}

impl TrackOptions {
    /// Ray-castable, visible-only, hidden elements skipped
    pub const fn pickable() -> Self {
        Self::RAY_CAST_ENABLED
            .union(Self::VISIBLE_ONLY)
            .union(Self::SKIP_HIDDEN)
    }

    /// Whether every flag is meaningful alongside the others
    pub const fn is_valid(self) -> bool {
        self.contains(Self::RAY_CAST_ENABLED)
            || !(self.contains(Self::VISIBLE_ONLY) || self.contains(Self::SKIP_HIDDEN))
    }

    /// Drop cast filters that have no ray structure to act on
    pub fn normalized(self) -> Self {
        if self.contains(Self::RAY_CAST_ENABLED) {
            self
        } else {
            self - Self::VISIBLE_ONLY - Self::SKIP_HIDDEN
        }
    }

    /// The filters this object contributes to every cast against it
    pub fn cast_filters(self) -> CastOptions {
        let mut filters = CastOptions::empty();
        if self.contains(Self::VISIBLE_ONLY) {
            filters.insert(CastOptions::VISIBLE_ONLY);
        }
        if self.contains(Self::SKIP_HIDDEN) {
            filters.insert(CastOptions::SKIP_HIDDEN);
        }
        filters
    }
}
