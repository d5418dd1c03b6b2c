use bstr::BString;

use crate::{
    error::{AssemblyResult, GraphInconsistency},
    graph::{End, OverlapGraph, Vertex},
    sequence::{Fragment, Orientation},
    store::SequenceStore,
};

/// A merged sequence together with the fragments it was built from,
/// in walk order and with the orientation each was read in.
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    pub record: Fragment,
    pub members: Vec<(BString, Orientation)>,
}

impl Contig {
    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// `members=F1+,F2-`
    pub fn description(&self) -> String {
        let members: Vec<String> = self
            .members
            .iter()
            .map(|(id, o)| format!("{}{}", id, o))
            .collect();
        format!("members={}", members.join(","))
    }
}

/// Folds paths of the overlap graph into contigs, using the store for
/// fragment sequences.
pub struct ContigSynthesizer<'a> {
    store: &'a SequenceStore,
}

impl<'a> ContigSynthesizer<'a> {
    pub fn new(store: &'a SequenceStore) -> Self {
        ContigSynthesizer { store }
    }

    /// A fresh copy of the fragment behind `v`, read in the direction
    /// the path enters it.
    fn enter(&self, v: &Vertex) -> Result<Fragment, GraphInconsistency> {
        let mut fragment = self
            .store
            .get(&v.fragment)
            .cloned()
            .ok_or_else(|| {
                GraphInconsistency::UnknownFragment(v.fragment.clone())
            })?;
        if v.end == End::Three {
            fragment.reverse_complement();
        }
        Ok(fragment)
    }

    /// Walks `path`, two vertices per fragment, appending to the first
    /// fragment the part of every following fragment that lies beyond
    /// its overlap with the previous one.
    pub fn synthesize(
        &self,
        graph: &OverlapGraph,
        path: &[Vertex],
    ) -> AssemblyResult<Contig> {
        let first = match path.first() {
            Some(v) => v,
            None => {
                return Ok(Contig {
                    record: Fragment::default(),
                    members: Vec::new(),
                })
            }
        };

        let mut record = self.enter(first)?;
        let mut members = vec![(record.id.clone(), record.orientation)];

        for k in (2..path.len()).step_by(2) {
            let prev = &path[k - 1];
            let cur = &path[k];

            let missing = || GraphInconsistency::MissingOverlap {
                from: prev.clone(),
                to: cur.clone(),
            };
            let overlap = graph.overlap_between(prev, cur).ok_or_else(missing)?;
            let offset = overlap.offset_for(cur).ok_or_else(missing)?;
            let frame = overlap.frame_orientation(cur).ok_or_else(missing)?;

            let walked = cur.end.entry_orientation();
            let offset = if walked != frame {
                offset.negated()
            } else {
                offset
            };

            let fragment = self.enter(cur)?;
            let suffix = fragment.substr_seq(&offset);
            log::trace!(
                "{} adds {} of {} bases at offset {}",
                cur,
                suffix.len(),
                fragment.len(),
                offset
            );

            members.push((fragment.id.clone(), fragment.orientation));
            record = record.concat(&suffix);
        }

        record.orientation = Orientation::Forward;
        Ok(Contig { record, members })
    }
}
