use bstr::BString;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::{
    graph::{EdgeId, Offset, Overlap, OverlapGraph, Vertex},
    parser::{AlignmentRecord, FragmentLengths},
};

/// What happened to a single alignment record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    SelfAlignment,
    /// Both ends terminal or both ends internal, so not a dovetail
    Contained,
    /// The reference is missing from the length table; `assemble`
    /// treats this as an unknown fragment
    UnknownReference,
    /// An incumbent overlap with an equal or higher score touches one
    /// of the record's vertices
    Inferior,
    /// The overlap was added after removing `replaced` weaker ones
    Accepted { replaced: usize },
}

/// Counts of record outcomes over a whole alignment stream
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct BuildStats {
    pub records: usize,
    pub self_alignments: usize,
    pub contained: usize,
    pub unknown_reference: usize,
    pub inferior: usize,
    pub accepted: usize,
    pub replaced: usize,
    pub fragments: usize,
    pub overlaps: usize,
}

impl BuildStats {
    fn record(&mut self, outcome: RecordOutcome) {
        use RecordOutcome as RO;
        self.records += 1;
        match outcome {
            RO::SelfAlignment => self.self_alignments += 1,
            RO::Contained => self.contained += 1,
            RO::UnknownReference => self.unknown_reference += 1,
            RO::Inferior => self.inferior += 1,
            RO::Accepted { replaced } => {
                self.accepted += 1;
                self.replaced += replaced;
            }
        }
    }
}

/// Turns a stream of alignments into an overlap graph in which every
/// vertex carries at most one overlap edge.
#[derive(Debug, Clone)]
pub struct OverlapGraphBuilder {
    graph: OverlapGraph,
    lengths: FragmentLengths,
    term_ignore_length: usize,
    stats: BuildStats,
}

impl OverlapGraphBuilder {
    /// `term_ignore_length` is the clip length from which an alignment
    /// end stops being considered terminal.
    pub fn new(lengths: FragmentLengths, term_ignore_length: usize) -> Self {
        OverlapGraphBuilder {
            graph: OverlapGraph::new(),
            lengths,
            term_ignore_length,
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn graph(&self) -> &OverlapGraph {
        &self.graph
    }

    pub fn push(&mut self, record: &AlignmentRecord) -> RecordOutcome {
        let outcome = self.consider(record);
        log::debug!(
            "{} -> {} ({}, AS {}): {:?}",
            record.query_name,
            record.reference_name,
            record.cigar,
            record.score,
            outcome
        );
        self.stats.record(outcome);
        outcome
    }

    fn consider(&mut self, record: &AlignmentRecord) -> RecordOutcome {
        if record.is_self_alignment() {
            return RecordOutcome::SelfAlignment;
        }

        let qprel = record.cigar.leading_clip();
        let qsufl = record.cigar.trailing_clip();

        let mut q5 = qprel < self.term_ignore_length;
        let mut q3 = qsufl < self.term_ignore_length;
        if q5 == q3 {
            return RecordOutcome::Contained;
        }
        let r5 = q3;

        let ref_len = match self.lengths.get(&record.reference_name) {
            Some(len) => len,
            None => {
                log::warn!(
                    "Reference {} of query {} is missing from the header",
                    record.reference_name,
                    record.query_name
                );
                return RecordOutcome::UnknownReference;
            }
        };

        // Offsets are taken before the strand swap, in the frame the
        // aligner reported the query in.
        let query_offset = if q5 {
            Offset::Single(-(qsufl as i64))
        } else {
            Offset::Range(0, qprel as i64)
        };
        let reference_offset = if r5 {
            let covered = (record.position - 1) + record.cigar.reference_span();
            Offset::Single(-(ref_len.saturating_sub(covered) as i64))
        } else {
            Offset::Range(0, record.position as i64 - 1)
        };

        let reverse = record.strand.is_reverse();
        if reverse {
            std::mem::swap(&mut q5, &mut q3);
        }

        let query = end_vertex(&record.query_name, q5);
        let reference = end_vertex(&record.reference_name, r5);

        let mut incumbents: Vec<EdgeId> = Vec::with_capacity(2);
        for v in [&query, &reference].iter() {
            if let Some((id, incumbent)) = self.graph.overlap_at(v) {
                if incumbent.score >= record.score {
                    return RecordOutcome::Inferior;
                }
                if !incumbents.contains(&id) {
                    incumbents.push(id);
                }
            }
        }

        for id in incumbents.iter() {
            if let Some(edge) = self.graph.remove_edge(*id) {
                log::debug!(
                    "Overlap {} -- {} replaced by {} -- {}",
                    edge.from,
                    edge.to,
                    query,
                    reference
                );
            }
        }

        self.graph.add_overlap_edge(Overlap {
            score: record.score,
            reverse,
            query,
            reference,
            query_offset,
            reference_offset,
        });

        RecordOutcome::Accepted {
            replaced: incumbents.len(),
        }
    }

    /// Adds the internal edge of every known fragment and hands over
    /// the graph.
    pub fn finish(mut self) -> (OverlapGraph, BuildStats) {
        for (name, _) in self.lengths.iter() {
            self.graph.add_internal_edge(name);
        }
        self.stats.fragments = self.lengths.len();
        self.stats.overlaps = self.graph.overlap_count();

        log::info!(
            "Overlap graph: {} fragments, {} overlaps kept from {} records \
             ({} self, {} contained, {} inferior, {} replaced)",
            self.stats.fragments,
            self.stats.overlaps,
            self.stats.records,
            self.stats.self_alignments,
            self.stats.contained,
            self.stats.inferior,
            self.stats.replaced,
        );

        (self.graph, self.stats)
    }
}

fn end_vertex(fragment: &BString, five: bool) -> Vertex {
    if five {
        Vertex::five(fragment)
    } else {
        Vertex::three(fragment)
    }
}
