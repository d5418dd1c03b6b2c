use crate::{contig::Contig, store::SequenceFormat};

use bstr::ByteSlice;
use std::fmt::Write;

/// Quality used for FASTQ contigs when a member carried none
const UNKNOWN_QUALITY: char = '!';

// Write FASTA record
pub fn write_fasta<T: Write>(contig: &Contig, stream: &mut T) -> std::fmt::Result {
    writeln!(stream, ">{} {}", contig.record.id, contig.description())?;
    writeln!(stream, "{}", contig.record.sequence.to_str_lossy())
}

// Write FASTQ record
pub fn write_fastq<T: Write>(contig: &Contig, stream: &mut T) -> std::fmt::Result {
    writeln!(stream, "@{} {}", contig.record.id, contig.description())?;
    writeln!(stream, "{}", contig.record.sequence.to_str_lossy())?;
    writeln!(stream, "+")?;
    match &contig.record.quality {
        Some(qual) if qual.len() == contig.len() => {
            writeln!(stream, "{}", qual.to_str_lossy())
        }
        _ => {
            let filler: String =
                std::iter::repeat(UNKNOWN_QUALITY).take(contig.len()).collect();
            writeln!(stream, "{}", filler)
        }
    }
}

pub fn contig_string(contig: &Contig, format: SequenceFormat) -> String {
    let mut result = String::new();
    let res = match format {
        SequenceFormat::Fasta => write_fasta(contig, &mut result),
        SequenceFormat::Fastq => write_fastq(contig, &mut result),
    };
    debug_assert!(res.is_ok());
    result
}

/// Serializes one contig onto an output stream
pub fn write_contig<W: std::io::Write>(
    contig: &Contig,
    format: SequenceFormat,
    out: &mut W,
) -> std::io::Result<()> {
    out.write_all(contig_string(contig, format).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Fragment, Orientation};

    fn contig(quality: Option<&[u8]>) -> Contig {
        let mut record = Fragment::new(b"contig1", b"ACGTACGTTTTT");
        if let Some(q) = quality {
            record = record.with_quality(q);
        }
        Contig {
            record,
            members: vec![
                ("F1".into(), Orientation::Forward),
                ("F2".into(), Orientation::Backward),
            ],
        }
    }

    #[test]
    fn print_fasta() {
        let string = contig_string(&contig(None), SequenceFormat::Fasta);
        assert_eq!(string, ">contig1 members=F1+,F2-\nACGTACGTTTTT\n");
    }

    #[test]
    fn print_fastq() {
        let string = contig_string(
            &contig(Some(b"IIIIIIIIHHHH")),
            SequenceFormat::Fastq,
        );
        assert_eq!(
            string,
            "@contig1 members=F1+,F2-\nACGTACGTTTTT\n+\nIIIIIIIIHHHH\n"
        );

        let string = contig_string(&contig(None), SequenceFormat::Fastq);
        assert!(string.ends_with("+\n!!!!!!!!!!!!\n"));
    }

    #[test]
    fn write_to_io() {
        let mut out: Vec<u8> = Vec::new();
        write_contig(&contig(None), SequenceFormat::Fasta, &mut out).unwrap();
        write_contig(&contig(None), SequenceFormat::Fasta, &mut out).unwrap();
        assert_eq!(out.lines().count(), 4);
    }
}
