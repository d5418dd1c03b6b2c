use bytemuck::{Contiguous, Pod, Zeroable};

use nom::{
    bytes::complete::take, character::complete::digit1, combinator::*,
    multi::fold_many1, sequence::pair, IResult,
};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// SAM alignment operations, numbered as in BAM.
#[repr(u8)]
#[derive(
    Contiguous, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum CIGAROp {
    M = 0,
    I = 1,
    D = 2,
    N = 3,
    S = 4,
    H = 5,
    P = 6,
    E = 7,
    X = 8,
}

const OP_SYMBOLS: &[u8; 9] = b"MIDNSHP=X";

impl CIGAROp {
    pub fn from_symbol(sym: u8) -> Option<Self> {
        let code = OP_SYMBOLS.iter().position(|&s| s == sym)?;
        Self::from_integer(code as u8)
    }

    pub fn symbol(self) -> u8 {
        OP_SYMBOLS[self.into_integer() as usize]
    }

    #[inline]
    pub fn consumes_query(self) -> bool {
        use CIGAROp::*;
        matches!(self, M | I | S | E | X)
    }

    #[inline]
    pub fn consumes_reference(self) -> bool {
        use CIGAROp::*;
        matches!(self, M | D | N | E | X)
    }

    /// Soft and hard clips both hide query bases from the alignment;
    /// hard clipped bases are just missing from the record's SEQ.
    #[inline]
    pub fn is_clip(self) -> bool {
        matches!(self, CIGAROp::S | CIGAROp::H)
    }
}

impl std::fmt::Display for CIGAROp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(self.symbol()))
    }
}

const MAX_RUN: u32 = 1 << 28;

/// One run of a CIGAR, length in the high 28 bits and op in the low 4,
/// as BAM stores it.
#[repr(transparent)]
#[derive(Zeroable, Pod, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CIGARRun(u32);

#[allow(clippy::len_without_is_empty)]
impl CIGARRun {
    pub fn new(len: u32, op: CIGAROp) -> Option<Self> {
        if len < MAX_RUN {
            Some(CIGARRun((len << 4) | u32::from(op.into_integer())))
        } else {
            None
        }
    }

    #[inline]
    pub fn len(self) -> usize {
        (self.0 >> 4) as usize
    }

    #[inline]
    pub fn op(self) -> CIGAROp {
        // the low bits always come from a CIGAROp
        CIGAROp::from_integer((self.0 & 0xF) as u8).unwrap_or(CIGAROp::M)
    }
}

impl From<CIGARRun> for u32 {
    fn from(run: CIGARRun) -> Self {
        bytemuck::cast(run)
    }
}

impl std::fmt::Display for CIGARRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.len(), self.op())
    }
}

fn parse_run(input: &[u8]) -> IResult<&[u8], CIGARRun> {
    let len = map_opt(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits).ok()?.parse::<u32>().ok()
    });
    let op = map_opt(take(1usize), |sym: &[u8]| CIGAROp::from_symbol(sym[0]));
    map_opt(pair(len, op), |(len, op)| CIGARRun::new(len, op))(input)
}

/// The alignment descriptor of a SAM record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CIGAR(Vec<CIGARRun>);

impl CIGAR {
    /// Parse a CIGAR from an ASCII byte slice. Trailing bytes that
    /// aren't part of the CIGAR make the whole parse fail, as does the
    /// SAM placeholder `*`.
    pub fn from_bytestring(i: &[u8]) -> Option<Self> {
        let runs = fold_many1(parse_run, Vec::new(), |mut acc, run| {
            acc.push(run);
            acc
        });
        let parsed: IResult<&[u8], CIGAR> = all_consuming(map(runs, CIGAR))(i);
        parsed.ok().map(|(_, cg)| cg)
    }

    pub fn runs(&self) -> &[CIGARRun] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sum_where<F>(&self, keep: F) -> usize
    where
        F: Fn(CIGAROp) -> bool,
    {
        self.0
            .iter()
            .filter(|run| keep(run.op()))
            .map(|run| run.len())
            .sum()
    }

    fn clip_run<'a, I>(runs: I) -> usize
    where
        I: Iterator<Item = &'a CIGARRun>,
    {
        runs.take_while(|run| run.op().is_clip())
            .map(|run| run.len())
            .sum()
    }

    /// Number of query bases clipped before the aligned span, counting
    /// both soft and hard clips.
    ///
    /// ```
    /// use olc::cigar::CIGAR;
    ///
    /// let cg = CIGAR::from_bytestring(b"3H2S10M4S").unwrap();
    /// assert_eq!(cg.leading_clip(), 5);
    /// assert_eq!(cg.trailing_clip(), 4);
    /// ```
    pub fn leading_clip(&self) -> usize {
        Self::clip_run(self.0.iter())
    }

    /// Number of query bases clipped after the aligned span.
    pub fn trailing_clip(&self) -> usize {
        Self::clip_run(self.0.iter().rev())
    }

    /// Length of the reference covered by the alignment.
    pub fn reference_span(&self) -> usize {
        self.sum_where(CIGAROp::consumes_reference)
    }

    /// Full length of the query, hard clips included.
    pub fn query_len(&self) -> usize {
        self.sum_where(|op| op.consumes_query() || op == CIGAROp::H)
    }
}

impl std::fmt::Display for CIGAR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|run| write!(f, "{}", run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimap2_style_cigars() {
        use CIGAROp::*;

        let cg = CIGAR::from_bytestring(b"120S880M3I17M").unwrap();
        let ops: Vec<_> = cg.runs().iter().map(|r| (r.len(), r.op())).collect();
        assert_eq!(ops, vec![(120, S), (880, M), (3, I), (17, M)]);
        assert_eq!(cg.to_string(), "120S880M3I17M");

        let cg = CIGAR::from_bytestring(b"5=1X5=2N4H").unwrap();
        assert_eq!(cg.to_string(), "5=1X5=2N4H");
        assert_eq!(u32::from(cg.runs()[1]), (1 << 4) | 8);
    }

    #[test]
    fn rejects_malformed() {
        assert!(CIGAR::from_bytestring(b"*").is_none());
        assert!(CIGAR::from_bytestring(b"").is_none());
        assert!(CIGAR::from_bytestring(b"M10").is_none());
        assert!(CIGAR::from_bytestring(b"10").is_none());
        assert!(CIGAR::from_bytestring(b"10M5Q").is_none());
        assert!(CIGAR::from_bytestring(b"10M ").is_none());
        assert!(CIGAR::from_bytestring(b"268435456M").is_none());
        assert!(CIGARRun::new(MAX_RUN, CIGAROp::M).is_none());
    }

    #[test]
    fn clips_at_both_ends() {
        let cg = CIGAR::from_bytestring(b"4S4M").unwrap();
        assert_eq!(cg.leading_clip(), 4);
        assert_eq!(cg.trailing_clip(), 0);

        let cg = CIGAR::from_bytestring(b"10M").unwrap();
        assert_eq!(cg.leading_clip(), 0);
        assert_eq!(cg.trailing_clip(), 0);

        let cg = CIGAR::from_bytestring(b"2H3S5M1I5M6S7H").unwrap();
        assert_eq!(cg.leading_clip(), 5);
        assert_eq!(cg.trailing_clip(), 13);
    }

    #[test]
    fn spans() {
        let cg = CIGAR::from_bytestring(b"2H3S5M1I2D5M6S").unwrap();
        assert_eq!(cg.reference_span(), 12);
        assert_eq!(cg.query_len(), 2 + 3 + 5 + 1 + 5 + 6);
    }
}
