use std::{error, fmt};

use bstr::BString;

use crate::{graph::Vertex, parser::ParseError};

pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// A broken structural invariant of the overlap graph. None of these
/// can be recovered from within the component they occur in.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphInconsistency {
    /// A vertex has more than two neighbours, so the component isn't a
    /// simple path.
    Junction { vertex: Vertex, degree: usize },
    /// A path references a fragment missing from the sequence store.
    UnknownFragment(BString),
    /// Two consecutive fragments in a path aren't joined by an overlap.
    MissingOverlap { from: Vertex, to: Vertex },
    /// A walk visited more vertices than the graph holds, or came back
    /// to a vertex it had already visited.
    RunawayWalk { start: Vertex, limit: usize },
    /// A cycle with no overlap edge on it, which can't be popped.
    UnbreakableCycle(Vertex),
}

impl fmt::Display for GraphInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use GraphInconsistency as GI;
        match self {
            GI::Junction { vertex, degree } => write!(
                f,
                "Vertex {} is a junction with {} neighbours",
                vertex, degree
            ),
            GI::UnknownFragment(id) => {
                write!(f, "Fragment `{}` is not in the sequence set", id)
            }
            GI::MissingOverlap { from, to } => {
                write!(f, "No overlap edge between {} and {}", from, to)
            }
            GI::RunawayWalk { start, limit } => write!(
                f,
                "Walk from {} did not terminate within {} vertices",
                start, limit
            ),
            GI::UnbreakableCycle(v) => {
                write!(f, "Cycle through {} has no overlap edge to remove", v)
            }
        }
    }
}

impl error::Error for GraphInconsistency {}

#[derive(Debug)]
pub enum AssemblyError {
    /// Alignments or sequences could not be read
    Parse(ParseError),
    Io(std::io::Error),
    /// The external aligner exited unsuccessfully; carries its stderr.
    Aligner { status: Option<i32>, stderr: String },
    Graph(GraphInconsistency),
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AssemblyError as AE;
        match self {
            AE::Parse(err) => write!(f, "{}", err),
            AE::Io(err) => write!(f, "I/O error: {}", err),
            AE::Aligner { status, stderr } => {
                match status {
                    Some(code) => {
                        write!(f, "Aligner exited with status {}", code)?
                    }
                    None => write!(f, "Aligner was terminated by a signal")?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ":\n{}", stderr.trim_end())?;
                }
                Ok(())
            }
            AE::Graph(err) => write!(f, "Graph inconsistency: {}", err),
        }
    }
}

impl error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            AssemblyError::Parse(err) => Some(err),
            AssemblyError::Io(err) => Some(err),
            AssemblyError::Graph(err) => Some(err),
            AssemblyError::Aligner { .. } => None,
        }
    }
}

impl From<ParseError> for AssemblyError {
    #[inline]
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for AssemblyError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<GraphInconsistency> for AssemblyError {
    #[inline]
    fn from(err: GraphInconsistency) -> Self {
        Self::Graph(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligner_error_carries_stderr() {
        let err = AssemblyError::Aligner {
            status: Some(1),
            stderr: "[ERROR] failed to open file 'x.fa'\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "Aligner exited with status 1:\n[ERROR] failed to open file 'x.fa'"
        );
    }

    #[test]
    fn junction_message() {
        let err: AssemblyError = GraphInconsistency::Junction {
            vertex: Vertex::three("r1"),
            degree: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Graph inconsistency: Vertex r1:3' is a junction with 3 neighbours"
        );
    }
}
