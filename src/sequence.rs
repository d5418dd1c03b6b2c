pub mod orientation;

pub use self::orientation::*;

use bstr::{BString, ByteSlice};

use crate::graph::Offset;

/// Complement lookup over the IUPAC nucleotide codes, case preserved;
/// every other byte maps to itself.
static COMPLEMENT: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }

    let pairs: [(u8, u8); 11] = [
        (b'A', b'T'),
        (b'C', b'G'),
        (b'U', b'A'),
        (b'R', b'Y'),
        (b'K', b'M'),
        (b'B', b'V'),
        (b'D', b'H'),
        (b'S', b'S'),
        (b'W', b'W'),
        (b'N', b'N'),
        (b'T', b'A'),
    ];
    let mut j = 0;
    while j < pairs.len() {
        let (a, b) = pairs[j];
        table[a as usize] = b;
        table[a.to_ascii_lowercase() as usize] = b.to_ascii_lowercase();
        if a != b'U' && a != b'T' {
            table[b as usize] = a;
            table[b.to_ascii_lowercase() as usize] = a.to_ascii_lowercase();
        }
        j += 1;
    }
    table
};

#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

/// Reverse complement a nucleotide sequence
///
/// ```
/// use olc::sequence::reverse_complement;
///
/// assert_eq!(reverse_complement(b"ACGTTTTT"), b"AAAAACGT".to_vec());
/// assert_eq!(reverse_complement(b"acgN"), b"Ncgt".to_vec());
/// ```
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// An identified sequence record together with the orientation it is
/// currently read in.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub id: BString,
    pub sequence: BString,
    pub quality: Option<BString>,
    pub orientation: Orientation,
}

impl Fragment {
    pub fn new(id: &[u8], sequence: &[u8]) -> Self {
        Fragment {
            id: BString::from(id),
            sequence: BString::from(sequence),
            quality: None,
            orientation: Orientation::Forward,
        }
    }

    pub fn with_quality(mut self, quality: &[u8]) -> Self {
        self.quality = Some(BString::from(quality));
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Flips the fragment in place; calling it twice restores the
    /// original.
    pub fn reverse_complement(&mut self) {
        let seq = reverse_complement(self.sequence.as_bytes());
        self.sequence = BString::from(seq);
        if let Some(qual) = self.quality.as_mut() {
            qual.reverse();
        }
        self.orientation = self.orientation.flip();
    }

    /// Extracts the part of the fragment selected by `offset`, keeping
    /// the identifier and orientation.
    pub fn substr_seq(&self, offset: &Offset) -> Fragment {
        let (start, end) = offset.bounds(self.len());
        Fragment {
            id: self.id.clone(),
            sequence: BString::from(&self.sequence[start..end]),
            quality: self
                .quality
                .as_ref()
                .map(|q| BString::from(&q[start..end])),
            orientation: self.orientation,
        }
    }

    /// Produces a new record extending this one with `other`. Qualities
    /// survive only if both sides carry them.
    pub fn concat(&self, other: &Fragment) -> Fragment {
        let mut sequence = self.sequence.clone();
        sequence.extend_from_slice(other.sequence.as_bytes());

        let quality = match (&self.quality, &other.quality) {
            (Some(a), Some(b)) => {
                let mut qual = a.clone();
                qual.extend_from_slice(b.as_bytes());
                Some(qual)
            }
            _ => None,
        };

        Fragment {
            id: self.id.clone(),
            sequence,
            quality,
            orientation: self.orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_complement_in_place() {
        let mut frag = Fragment::new(b"f", b"AACGTN").with_quality(b"ABCDEF");
        frag.reverse_complement();
        assert_eq!(frag.sequence, "NACGTT");
        assert_eq!(frag.quality.as_ref().unwrap(), "FEDCBA");
        assert_eq!(frag.orientation, Orientation::Backward);

        frag.reverse_complement();
        assert_eq!(frag.sequence, "AACGTN");
        assert_eq!(frag.orientation, Orientation::Forward);
    }

    #[test]
    fn iupac_complements() {
        assert_eq!(reverse_complement(b"RYKMBVDHSWU"), b"AWSDHBVKMRY".to_vec());
    }

    #[test]
    fn substr_by_offset() {
        let frag = Fragment::new(b"f", b"ACGTTTTT").with_quality(b"01234567");

        let tail = frag.substr_seq(&Offset::Single(-4));
        assert_eq!(tail.sequence, "TTTT");
        assert_eq!(tail.quality.unwrap(), "4567");

        let head = frag.substr_seq(&Offset::Single(3));
        assert_eq!(head.sequence, "ACG");

        let prefix = frag.substr_seq(&Offset::Range(0, 2));
        assert_eq!(prefix.sequence, "AC");

        let suffix = frag.substr_seq(&Offset::Range(0, -2));
        assert_eq!(suffix.sequence, "TT");

        let nothing = frag.substr_seq(&Offset::Single(0));
        assert!(nothing.is_empty());

        let clamped = frag.substr_seq(&Offset::Single(-40));
        assert_eq!(clamped.sequence, frag.sequence);
    }

    #[test]
    fn concat_extends() {
        let a = Fragment::new(b"a", b"ACGTACGT");
        let b = Fragment::new(b"b", b"TTTT");
        let ab = a.concat(&b);
        assert_eq!(ab.id, "a");
        assert_eq!(ab.sequence, "ACGTACGTTTTT");
        assert!(ab.quality.is_none());
        assert_eq!(ab.len(), a.len() + b.len());
    }
}
