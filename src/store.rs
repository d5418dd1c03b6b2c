use crate::{
    parser::{ParseError, SAMResult},
    sequence::Fragment,
};

use bstr::{BString, ByteSlice};
use fnv::FnvHashMap;
use memmap::Mmap;

use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

impl SequenceFormat {
    /// Detects the format from the first non-whitespace byte
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'>') => Some(SequenceFormat::Fasta),
            Some(b'@') => Some(SequenceFormat::Fastq),
            _ => None,
        }
    }
}

/// All input fragments, keyed by identifier and kept in input order
#[derive(Debug, Clone)]
pub struct SequenceStore {
    format: SequenceFormat,
    fragments: FnvHashMap<BString, Fragment>,
    order: Vec<BString>,
}

fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

fn record_id(header: &[u8]) -> &[u8] {
    header.fields_with(is_space).next().unwrap_or(&[])
}

impl SequenceStore {
    /// Memory-maps the file at `path` and parses every record in it
    pub fn from_path<P: AsRef<Path>>(path: P) -> SAMResult<Self> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Err(ParseError::UnknownFormat);
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap[..])
    }

    pub fn from_bytes(bytes: &[u8]) -> SAMResult<Self> {
        let format =
            SequenceFormat::detect(bytes).ok_or(ParseError::UnknownFormat)?;

        let mut store = SequenceStore {
            format,
            fragments: FnvHashMap::default(),
            order: Vec::new(),
        };

        match format {
            SequenceFormat::Fasta => store.parse_fasta(bytes)?,
            SequenceFormat::Fastq => store.parse_fastq(bytes)?,
        }

        log::debug!(
            "Loaded {} {:?} records",
            store.order.len(),
            store.format
        );

        Ok(store)
    }

    fn insert(&mut self, fragment: Fragment) -> SAMResult<()> {
        if self.fragments.contains_key(&fragment.id) {
            return Err(ParseError::DuplicateId(fragment.id));
        }
        self.order.push(fragment.id.clone());
        self.fragments.insert(fragment.id.clone(), fragment);
        Ok(())
    }

    fn parse_fasta(&mut self, bytes: &[u8]) -> SAMResult<()> {
        let mut header: Option<&[u8]> = None;
        let mut sequence: Vec<u8> = Vec::new();

        for line in bytes.lines() {
            let line = line.trim_end_with(is_space);
            if let Some(rest) = line.strip_prefix(b">") {
                if let Some(prev) = header.replace(rest) {
                    let id = record_id(prev);
                    if id.is_empty() {
                        return Err(ParseError::invalid_record(prev));
                    }
                    self.insert(Fragment::new(id, &sequence))?;
                    sequence.clear();
                }
            } else if header.is_some() {
                sequence.extend(line.iter().filter(|b| !b.is_ascii_whitespace()));
            } else if !line.is_empty() {
                return Err(ParseError::UnknownFormat);
            }
        }

        if let Some(prev) = header {
            let id = record_id(prev);
            if id.is_empty() {
                return Err(ParseError::invalid_record(prev));
            }
            self.insert(Fragment::new(id, &sequence))?;
        }
        Ok(())
    }

    fn parse_fastq(&mut self, bytes: &[u8]) -> SAMResult<()> {
        let mut lines = bytes
            .lines()
            .map(|l| l.trim_end_with(is_space))
            .filter(|l| !l.is_empty());

        while let Some(header) = lines.next() {
            let header = header
                .strip_prefix(b"@")
                .ok_or_else(|| ParseError::invalid_record(header))?;
            let id = record_id(header);
            if id.is_empty() {
                return Err(ParseError::invalid_record(header));
            }

            let seq = lines.next();
            let plus = lines.next();
            let qual = lines.next();
            match (seq, plus, qual) {
                (Some(seq), Some(plus), Some(qual))
                    if plus.starts_with(b"+") && seq.len() == qual.len() =>
                {
                    self.insert(Fragment::new(id, seq).with_quality(qual))?;
                }
                _ => return Err(ParseError::invalid_record(header)),
            }
        }
        Ok(())
    }

    pub fn format(&self) -> SequenceFormat {
        self.format
    }

    pub fn get(&self, id: &[u8]) -> Option<&Fragment> {
        self.fragments.get(id.as_bstr())
    }

    pub fn contains(&self, id: &[u8]) -> bool {
        self.fragments.contains_key(id.as_bstr())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers in input order
    pub fn ids(&self) -> impl Iterator<Item = &BString> {
        self.order.iter()
    }

    /// Fragments in input order
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> + '_ {
        self.order.iter().filter_map(move |id| self.fragments.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fasta_multiline() {
        let input = b">F1 first read\nACGT\nACGT\n\n>F2\nACGTTTTT\n";
        let store = SequenceStore::from_bytes(input).unwrap();
        assert_eq!(store.format(), SequenceFormat::Fasta);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b"F1").unwrap().sequence, "ACGTACGT");
        assert_eq!(store.get(b"F2").unwrap().sequence, "ACGTTTTT");
        assert!(store.get(b"F1").unwrap().quality.is_none());

        let ids: Vec<_> = store.ids().cloned().collect();
        assert_eq!(ids, vec![BString::from("F1"), BString::from("F2")]);
    }

    #[test]
    fn fastq_records() {
        let input = b"@r1 extra\nACGT\n+\nIIII\n@r2\nGG\n+r2\n#I\n";
        let store = SequenceStore::from_bytes(input).unwrap();
        assert_eq!(store.format(), SequenceFormat::Fastq);
        let r1 = store.get(b"r1").unwrap();
        assert_eq!(r1.sequence, "ACGT");
        assert_eq!(r1.quality.as_ref().unwrap(), "IIII");
        assert_eq!(store.get(b"r2").unwrap().len(), 2);
    }

    #[test]
    fn truncated_fastq() {
        let input = b"@r1\nACGT\n+\nIII\n";
        assert!(matches!(
            SequenceStore::from_bytes(input),
            Err(ParseError::InvalidRecord(_))
        ));
    }

    #[test]
    fn unknown_format_and_duplicates() {
        assert!(matches!(
            SequenceStore::from_bytes(b"ACGT\n"),
            Err(ParseError::UnknownFormat)
        ));
        assert!(matches!(
            SequenceStore::from_bytes(b""),
            Err(ParseError::UnknownFormat)
        ));

        match SequenceStore::from_bytes(b">a\nAC\n>b\nGG\n>a\nTT\n") {
            Err(ParseError::DuplicateId(id)) => assert_eq!(id, "a"),
            other => panic!("expected a duplicate id error, got {:?}", other),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">x\nACGTACGT\n>y\nTTTT").unwrap();
        file.flush().unwrap();

        let store = SequenceStore::from_path(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.iter().map(|f| f.len()).sum::<usize>(), 12);

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            SequenceStore::from_path(empty.path()),
            Err(ParseError::UnknownFormat)
        ));
    }
}
