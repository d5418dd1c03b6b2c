pub mod error;

pub use self::error::*;

use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;

use std::io::prelude::*;

use crate::{
    cigar::CIGAR,
    optfields::{OptField, OptFields},
    sequence::Orientation,
};

const FLAG_UNMAPPED: u16 = 0x4;
const FLAG_REVERSE: u16 = 0x10;

/// Fragment lengths keyed by identifier, as announced by the `@SQ`
/// header lines of the alignment stream.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct FragmentLengths {
    lengths: FnvHashMap<BString, usize>,
    order: Vec<BString>,
}

impl FragmentLengths {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a fragment, returning false if it was already known;
    /// the first length seen wins.
    pub fn insert(&mut self, name: BString, len: usize) -> bool {
        if self.lengths.contains_key(&name) {
            false
        } else {
            self.lengths.insert(name.clone(), len);
            self.order.push(name);
            true
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<usize> {
        self.lengths.get(name.as_bstr()).copied()
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.lengths.contains_key(name.as_bstr())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates in header order
    pub fn iter(&self) -> impl Iterator<Item = (&BString, usize)> + '_ {
        self.order.iter().map(move |n| (n, self.lengths[n]))
    }
}

/// One alignment between a query fragment and a reference fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub query_name: BString,
    pub reference_name: BString,
    pub strand: Orientation,
    /// 1-based leftmost reference position
    pub position: usize,
    pub cigar: CIGAR,
    pub score: i64,
}

impl AlignmentRecord {
    pub fn is_self_alignment(&self) -> bool {
        self.query_name == self.reference_name
    }
}

/// Parsing configuration for SAM streams
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SAMParser {
    score_tag: [u8; 2],
    tolerance: ParserTolerance,
}

impl Default for SAMParser {
    fn default() -> Self {
        SAMParser {
            score_tag: *b"AS",
            tolerance: Default::default(),
        }
    }
}

impl SAMParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_score_tag(mut self, tag: [u8; 2]) -> Self {
        self.score_tag = tag;
        self
    }

    pub fn with_tolerance(mut self, tolerance: ParserTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> ParserTolerance {
        self.tolerance
    }

    /// Parses an `@SQ` header line into a name and length. Returns
    /// Ok(None) for every other header line.
    pub fn parse_header_line(
        &self,
        line: &[u8],
    ) -> SAMFieldResult<Option<(BString, usize)>> {
        let mut fields = line.split_str(b"\t");
        if fields.next() != Some(&b"@SQ"[..]) {
            return Ok(None);
        }

        let mut name = None;
        let mut len = None;
        for field in fields {
            if let Some(sn) = field.strip_prefix(b"SN:") {
                name = Some(BString::from(sn));
            } else if let Some(ln) = field.strip_prefix(b"LN:") {
                len = Some(ln.to_str()?.parse::<usize>()?);
            }
        }

        match (name, len) {
            (Some(name), Some(len)) => Ok(Some((name, len))),
            (None, _) => Err(ParseFieldError::InvalidField("SN")),
            (_, None) => Err(ParseFieldError::InvalidField("LN")),
        }
    }

    fn parse_next<I, T>(mut input: I, field: &'static str) -> SAMFieldResult<T>
    where
        I: Iterator,
        I::Item: AsRef<[u8]>,
        T: std::str::FromStr,
    {
        let next = input.next().ok_or(ParseFieldError::MissingFields)?;
        next.as_ref()
            .to_str()?
            .parse()
            .map_err(|_| ParseFieldError::InvalidField(field))
    }

    fn next_field<'a, I>(fields: &mut I) -> SAMFieldResult<&'a [u8]>
    where
        I: Iterator<Item = &'a [u8]>,
    {
        fields.next().ok_or(ParseFieldError::MissingFields)
    }

    fn parse_record_fields(&self, line: &[u8]) -> SAMResult<AlignmentRecord> {
        let mut fields = line.split_str(b"\t");

        let query_name = BString::from(Self::next_field(&mut fields)?);
        let flag: u16 = Self::parse_next(&mut fields, "FLAG")?;
        let reference_name = Self::next_field(&mut fields)?;
        let position: usize = Self::parse_next(&mut fields, "POS")?;
        let _mapq = Self::next_field(&mut fields)?;
        let cigar = Self::next_field(&mut fields)?;

        if flag & FLAG_UNMAPPED != 0 || reference_name == b"*" || cigar == b"*"
        {
            return Err(ParseError::Unmapped);
        }

        let cigar = CIGAR::from_bytestring(cigar)
            .ok_or(ParseFieldError::InvalidField("CIGAR"))?;
        if position == 0 {
            return Err(ParseFieldError::InvalidField("POS").into());
        }

        // RNEXT PNEXT TLEN SEQ QUAL
        for _ in 0..5 {
            Self::next_field(&mut fields)?;
        }

        let score = OptFields::parse(fields)
            .get(&self.score_tag)
            .and_then(OptField::as_int)
            .ok_or(ParseFieldError::MissingScore(self.score_tag))?;

        let strand = Orientation::from_reverse_flag(flag & FLAG_REVERSE != 0);

        Ok(AlignmentRecord {
            query_name,
            reference_name: reference_name.into(),
            strand,
            position,
            cigar,
            score,
        })
    }

    /// Parse a single SAM alignment line
    pub fn parse_record(&self, line: &[u8]) -> SAMResult<AlignmentRecord> {
        let line = line.trim_end_with(|c| c == '\r' || c == '\n');
        if line.is_empty() {
            return Err(ParseError::EmptyLine);
        }
        self.parse_record_fields(line).map_err(|err| match err {
            ParseError::InvalidField(field_err) => {
                ParseError::invalid_line(field_err, line)
            }
            err => err,
        })
    }
}

/// Streams a SAM file: the header is consumed eagerly on construction,
/// after which the reader yields alignment records in file order.
pub struct SAMReader<R> {
    reader: R,
    parser: SAMParser,
    lengths: FragmentLengths,
    pending: Option<Vec<u8>>,
    line_buf: Vec<u8>,
}

impl<R: BufRead> SAMReader<R> {
    pub fn new(mut reader: R, parser: SAMParser) -> SAMResult<Self> {
        let mut lengths = FragmentLengths::new();
        let mut line_buf = Vec::with_capacity(1024);

        let pending = loop {
            line_buf.clear();
            let n_read = reader.read_until(b'\n', &mut line_buf)?;
            if n_read == 0 {
                break None;
            }
            let line = line_buf.trim_end_with(|c| c == '\r' || c == '\n');
            if line.first() != Some(&b'@') {
                break Some(line_buf.clone());
            }
            match parser.parse_header_line(line) {
                Ok(Some((name, len))) => {
                    if !lengths.insert(name.clone(), len) {
                        log::warn!("Reference {} is declared twice", name);
                    }
                }
                Ok(None) => (),
                Err(err) => {
                    let err = ParseError::invalid_line(err, line);
                    if !err.can_safely_continue(&parser.tolerance) {
                        return Err(err);
                    }
                }
            }
        };

        log::debug!("SAM header declares {} references", lengths.len());

        Ok(SAMReader {
            reader,
            parser,
            lengths,
            pending,
            line_buf,
        })
    }

    pub fn lengths(&self) -> &FragmentLengths {
        &self.lengths
    }

    fn next_line(&mut self) -> SAMResult<Option<Vec<u8>>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        self.line_buf.clear();
        let n_read = self.reader.read_until(b'\n', &mut self.line_buf)?;
        if n_read == 0 {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.line_buf)))
        }
    }
}

impl<R: BufRead> Iterator for SAMReader<R> {
    type Item = SAMResult<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            };
            match self.parser.parse_record(&line) {
                Ok(record) => return Some(Ok(record)),
                Err(err) if err.can_safely_continue(&self.parser.tolerance) => {
                    log::trace!("Skipping SAM line: {}", err);
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAM: &str = "@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:F1\tLN:8
@SQ\tSN:F2\tLN:8
@PG\tID:minimap2\tPN:minimap2
F2\t0\tF1\t5\t60\t4M4S\t*\t0\t0\tACGTTTTT\t*\tNM:i:0\tAS:i:32
F3\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\t*

F1\t16\tF2\t1\t60\t4S4M\t*\t0\t0\tACGTACGT\t*\ttp:A:P\tAS:i:30
";

    #[test]
    fn header_lengths() {
        let reader = SAMReader::new(SAM.as_bytes(), SAMParser::new()).unwrap();
        let lengths = reader.lengths();
        assert_eq!(lengths.len(), 2);
        assert_eq!(lengths.get(b"F1"), Some(8));
        assert_eq!(lengths.get(b"F2"), Some(8));
        assert_eq!(lengths.get(b"F3"), None);

        let names: Vec<_> = lengths.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec![BString::from("F1"), BString::from("F2")]);
    }

    #[test]
    fn records_skip_unmapped_and_empty() {
        let reader = SAMReader::new(SAM.as_bytes(), SAMParser::new()).unwrap();
        let records: Vec<_> = reader.collect::<SAMResult<_>>().unwrap();
        assert_eq!(records.len(), 2);

        let first: &AlignmentRecord = &records[0];
        assert_eq!(first.query_name, "F2");
        assert_eq!(first.reference_name, "F1");
        assert_eq!(first.strand, Orientation::Forward);
        assert_eq!(first.position, 5);
        assert_eq!(
            first.cigar,
            CIGAR::from_bytestring(b"4M4S").unwrap()
        );
        assert_eq!(first.score, 32);

        assert_eq!(records[1].strand, Orientation::Backward);
        assert_eq!(records[1].score, 30);
    }

    #[test]
    fn missing_score_is_an_error() {
        let sam = "@SQ\tSN:F1\tLN:8\nF2\t0\tF1\t5\t60\t4M4S\t*\t0\t0\t*\t*\tNM:i:0\n";
        let mut reader =
            SAMReader::new(sam.as_bytes(), SAMParser::new()).unwrap();
        match reader.next() {
            Some(Err(ParseError::InvalidLine(err, _))) => {
                assert_eq!(err, ParseFieldError::MissingScore(*b"AS"))
            }
            other => panic!("expected an invalid line, got {:?}", other),
        }

        let parser = SAMParser::new().with_score_tag(*b"NM");
        let mut reader = SAMReader::new(sam.as_bytes(), parser).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().score, 0);
    }

    #[test]
    fn tolerance_controls_malformed_lines() {
        let sam = "F2\t0\tF1\tfive\t60\t4M\t*\t0\t0\t*\t*\tAS:i:1
F2\t0\tF1\t5\t60\t4M\t*\t0\t0\t*\t*\tAS:i:2
";
        let reader = SAMReader::new(sam.as_bytes(), SAMParser::new()).unwrap();
        assert!(reader.collect::<SAMResult<Vec<_>>>().is_err());

        let parser = SAMParser::new().with_tolerance(ParserTolerance::IgnoreAll);
        let reader = SAMReader::new(sam.as_bytes(), parser).unwrap();
        let records = reader.collect::<SAMResult<Vec<_>>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 2);

        let parser = SAMParser::new().with_tolerance(ParserTolerance::Pedantic);
        let sam = "F3\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*\n";
        let mut reader = SAMReader::new(sam.as_bytes(), parser).unwrap();
        assert!(matches!(reader.next(), Some(Err(ParseError::Unmapped))));
    }

    #[test]
    fn self_alignment() {
        let parser = SAMParser::new();
        let record = parser
            .parse_record(b"F1\t0\tF1\t1\t60\t8M\t*\t0\t0\t*\t*\tAS:i:16")
            .unwrap();
        assert!(record.is_self_alignment());
    }
}
