#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Strand of an alignment, or the direction a fragment is read in
/// within a contig
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Orientation {
    Forward,
    Backward,
}

impl Orientation {
    /// `Backward` when the reverse-complement bit is set in a SAM FLAG.
    #[inline]
    pub fn from_reverse_flag(reverse: bool) -> Self {
        if reverse {
            Self::Backward
        } else {
            Self::Forward
        }
    }

    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Self::Backward
    }

    #[inline]
    pub fn flip(self) -> Self {
        Self::from_reverse_flag(!self.is_reverse())
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Forward
    }
}

/// `+` for forward, `-` for backward, as in contig member lists.
///
/// ```
/// use olc::sequence::Orientation as O;
///
/// assert_eq!(format!("{}{}", O::Forward, O::Backward), "+-");
/// assert_eq!(O::Forward.flip(), O::Backward);
/// ```
impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_reverse() { "-" } else { "+" })
    }
}
