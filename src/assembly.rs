use std::io::{BufRead, Write};

use bstr::BString;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::{
    builder::{BuildStats, OverlapGraphBuilder, RecordOutcome},
    contig::ContigSynthesizer,
    error::{AssemblyResult, GraphInconsistency},
    linearize::{linearize, LinearizeReport},
    parser::{ParserTolerance, SAMParser, SAMReader},
    sequence::Orientation,
    store::SequenceStore,
    walker::next_path,
    writer::write_contig,
};

/// Parameters of an assembly run
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    /// Clips shorter than this still count as reaching the fragment end
    pub term_ignore_length: u32,
    /// Optional field holding the alignment score
    pub score_tag: [u8; 2],
    pub tolerance: ParserTolerance,
    pub contig_prefix: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            term_ignore_length: 20,
            score_tag: *b"AS",
            tolerance: ParserTolerance::Safe,
            contig_prefix: String::from("contig"),
        }
    }
}

impl AssemblyConfig {
    pub fn with_term_ignore_length(mut self, len: u32) -> Self {
        self.term_ignore_length = len;
        self
    }

    pub fn with_score_tag(mut self, tag: [u8; 2]) -> Self {
        self.score_tag = tag;
        self
    }

    pub fn with_tolerance(mut self, tolerance: ParserTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_contig_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.contig_prefix = prefix.into();
        self
    }

    fn sam_parser(&self) -> SAMParser {
        SAMParser::new()
            .with_score_tag(self.score_tag)
            .with_tolerance(self.tolerance)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ContigSummary {
    pub name: BString,
    pub length: usize,
    pub members: Vec<(BString, Orientation)>,
}

/// Everything an assembly run has to say besides the contigs
/// themselves.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct AssemblyReport {
    pub build: BuildStats,
    pub linearize: LinearizeReport,
    pub contigs: Vec<ContigSummary>,
}

impl AssemblyReport {
    /// Save the report to a JSON file.
    #[cfg(feature = "serde1")]
    pub fn save_json<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> std::io::Result<()> {
        use std::{fs::File, io::BufWriter};
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load a report from a JSON file.
    #[cfg(feature = "serde1")]
    pub fn load_json<P: AsRef<std::path::Path>>(
        path: P,
    ) -> std::io::Result<Self> {
        use std::{fs::File, io::BufReader};
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader)?;
        Ok(report)
    }

    pub fn total_length(&self) -> usize {
        self.contigs.iter().map(|c| c.length).sum()
    }
}

/// Assembles the fragments in `store` using the SAM alignments read
/// from `alignments`, writing one record per contig to `out`.
///
/// Fragments missing from the SAM header are still assembled, as
/// contigs of their own. An alignment against a fragment known to
/// neither the header nor the store is fatal. Nothing is written to
/// `out` unless every path could be synthesized.
pub fn assemble<R, W>(
    alignments: R,
    store: &SequenceStore,
    config: &AssemblyConfig,
    out: &mut W,
) -> AssemblyResult<AssemblyReport>
where
    R: BufRead,
    W: Write,
{
    let reader = SAMReader::new(alignments, config.sam_parser())?;

    let mut lengths = reader.lengths().clone();
    for fragment in store.iter() {
        match lengths.get(&fragment.id) {
            Some(len) if len != fragment.len() => log::warn!(
                "Fragment {} is {} bases long but the header says {}",
                fragment.id,
                fragment.len(),
                len
            ),
            Some(_) => (),
            None => {
                lengths.insert(fragment.id.clone(), fragment.len());
            }
        }
    }

    let mut builder =
        OverlapGraphBuilder::new(lengths, config.term_ignore_length as usize);
    for record in reader {
        let record = record?;
        if builder.push(&record) == RecordOutcome::UnknownReference {
            return Err(GraphInconsistency::UnknownFragment(
                record.reference_name,
            )
            .into());
        }
    }
    let (mut graph, build) = builder.finish();

    let linearize = linearize(&mut graph)?;

    let synthesizer = ContigSynthesizer::new(store);
    let mut contigs = Vec::new();
    let mut summaries = Vec::new();

    loop {
        let path = next_path(&graph)?;
        if path.is_empty() {
            break;
        }

        let mut contig = synthesizer.synthesize(&graph, &path)?;
        let serial = summaries.len() + 1;
        contig.record.id =
            BString::from(format!("{}{}", config.contig_prefix, serial));

        log::info!(
            "{}: {} fragments, {} bases",
            contig.record.id,
            contig.members.len(),
            contig.len()
        );

        for v in path.iter() {
            graph.remove_vertex(v);
        }

        summaries.push(ContigSummary {
            name: contig.record.id.clone(),
            length: contig.len(),
            members: contig.members.clone(),
        });
        contigs.push(contig);
    }

    for contig in contigs.iter() {
        write_contig(contig, store.format(), out)?;
    }

    let report = AssemblyReport {
        build,
        linearize,
        contigs: summaries,
    };
    log::info!(
        "Assembled {} contigs totalling {} bases",
        report.contigs.len(),
        report.total_length()
    );
    Ok(report)
}
