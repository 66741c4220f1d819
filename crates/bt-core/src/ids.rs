//! Strongly typed identifier wrappers for dataset primitives.
//!
//! Ids follow the OSM editing convention: primitives loaded from a dataset
//! carry positive ids, primitives created during an edit session carry
//! negative ids until the host uploads them.  All ids are `Copy + Ord + Hash`
//! so they can key maps and sort deterministically.

use std::fmt;

/// Generate a typed ID wrapper around an `i64`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty) => $tag:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub $inner);

        impl $name {
            /// `true` for ids handed out during an edit session (not yet
            /// known to the upstream database).
            #[inline(always)]
            pub fn is_new(self) -> bool {
                self.0 < 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> Self {
                $name(raw)
            }
        }
    };
}

typed_id! {
    /// Identity of a point node.
    pub struct NodeId(i64) => "n";
}

typed_id! {
    /// Identity of a way (ordered node polyline).
    pub struct WayId(i64) => "w";
}
