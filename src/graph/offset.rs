#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Selects the part of a fragment lying outside an overlap. The sign
/// says which end the selection is anchored to: non-negative lengths
/// count from the 5' end, negative ones from the 3' end.
///
/// * `Single(n)` is the first `n` bases, `Single(-n)` the last `n`.
/// * `Range(s, n)` is `n` bases starting `s` in from the 5' end;
///   `Range(s, -n)` is `n` bases ending `s` in from the 3' end.
///
/// Negating an offset mirrors it onto the reverse complement of the
/// fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Offset {
    Single(i64),
    Range(i64, i64),
}

impl Offset {
    pub fn negated(self) -> Self {
        match self {
            Offset::Single(v) => Offset::Single(-v),
            Offset::Range(s, l) => Offset::Range(-s, -l),
        }
    }

    /// Half-open byte bounds of the selection within a sequence of
    /// length `len`, clamped to the sequence.
    ///
    /// ```
    /// use olc::graph::Offset;
    ///
    /// assert_eq!(Offset::Single(-4).bounds(8), (4, 8));
    /// assert_eq!(Offset::Range(0, 4).bounds(8), (0, 4));
    /// assert_eq!(Offset::Range(0, 4).negated().bounds(8), (4, 8));
    /// ```
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let clamp = |v: i64| (v.unsigned_abs() as usize).min(len);
        match *self {
            Offset::Single(v) if v >= 0 => (0, clamp(v)),
            Offset::Single(v) => (len - clamp(v), len),
            Offset::Range(s, l) if l >= 0 => {
                let start = clamp(s);
                (start, (start + clamp(l)).min(len))
            }
            Offset::Range(s, l) => {
                let end = len - clamp(s);
                (end.saturating_sub(clamp(l)), end)
            }
        }
    }

    /// Number of bases the offset selects from a sequence of length
    /// `len`.
    pub fn selected_len(&self, len: usize) -> usize {
        let (start, end) = self.bounds(len);
        end - start
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Offset::Single(v) => write!(f, "({})", v),
            Offset::Range(s, l) => write!(f, "({}, {})", s, l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_mirrors() {
        let len = 10;
        let offsets = [
            Offset::Single(3),
            Offset::Single(-3),
            Offset::Range(0, 6),
            Offset::Range(2, 3),
            Offset::Range(2, -3),
        ];
        for off in offsets.iter() {
            let (s, e) = off.bounds(len);
            let (ns, ne) = off.negated().bounds(len);
            assert_eq!((ns, ne), (len - e, len - s), "{}", off);
        }
    }

    #[test]
    fn zero_selects_nothing() {
        assert_eq!(Offset::Single(0).selected_len(5), 0);
        assert_eq!(Offset::Single(0).negated().selected_len(5), 0);
        assert_eq!(Offset::Range(0, 0).selected_len(5), 0);
    }

    #[test]
    fn clamped_to_sequence() {
        assert_eq!(Offset::Single(12).bounds(5), (0, 5));
        assert_eq!(Offset::Range(3, 12).bounds(5), (3, 5));
        assert_eq!(Offset::Range(9, -2).bounds(5), (0, 0));
    }
}
