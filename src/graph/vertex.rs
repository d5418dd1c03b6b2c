use bstr::{BStr, BString, ByteSlice};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::sequence::Orientation;

/// One extremity of a fragment. 5' sorts before 3'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum End {
    Five,
    Three,
}

impl End {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            End::Five => End::Three,
            End::Three => End::Five,
        }
    }

    /// A fragment entered at its 5' end is read forward, one entered at
    /// its 3' end is read as its reverse complement.
    #[inline]
    pub fn entry_orientation(self) -> Orientation {
        match self {
            End::Five => Orientation::Forward,
            End::Three => Orientation::Backward,
        }
    }
}

impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            End::Five => write!(f, "5'"),
            End::Three => write!(f, "3'"),
        }
    }
}

/// A graph vertex: the pair of a fragment identifier and one of its
/// ends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub fragment: BString,
    pub end: End,
}

impl Vertex {
    pub fn new<N: AsRef<[u8]>>(fragment: N, end: End) -> Self {
        Vertex {
            fragment: BString::from(fragment.as_ref()),
            end,
        }
    }

    pub fn five<N: AsRef<[u8]>>(fragment: N) -> Self {
        Self::new(fragment, End::Five)
    }

    pub fn three<N: AsRef<[u8]>>(fragment: N) -> Self {
        Self::new(fragment, End::Three)
    }

    pub fn fragment(&self) -> &BStr {
        self.fragment.as_bstr()
    }

    /// The other end of the same fragment
    pub fn mate(&self) -> Self {
        Vertex {
            fragment: self.fragment.clone(),
            end: self.end.opposite(),
        }
    }

    pub fn same_fragment(&self, other: &Vertex) -> bool {
        self.fragment == other.fragment
    }
}

/// Vertices are displayed as `<fragment>:<end>`, e.g. `read7:3'`.
impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.fragment, self.end)
    }
}
