use std::{error, fmt};

use bstr::{BString, ByteSlice};

pub type SAMFieldResult<T> = Result<T, ParseFieldError>;
pub type SAMResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum ParserTolerance {
    IgnoreAll,
    Safe,
    Pedantic,
}

impl Default for ParserTolerance {
    fn default() -> Self {
        Self::Safe
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFieldError {
    /// A field that must be text held invalid UTF-8.
    Utf8Error,
    /// A numeric field held something else.
    ParseFromStringError,
    /// A mandatory column, named as in the SAM format, was malformed.
    InvalidField(&'static str),
    /// The optional field carrying the alignment score was missing or
    /// wasn't an integer.
    MissingScore([u8; 2]),
    /// The line ended before all mandatory columns were read.
    MissingFields,
}

macro_rules! impl_many_from {
    ($to:ty, ($from:ty, $out:expr)) => (
        impl From<$from> for $to {
            fn from(_: $from) -> Self {
                $out
            }
        }
    );
    ($to:ty, ($from:ty, $out:expr), $(($f:ty, $o:expr)),* $(,)?) => (
        impl From<$from> for $to {
            fn from(_: $from) -> Self {
                $out
            }
        }
        impl_many_from!($to, $(($f, $o)),*);
    );
}

impl_many_from!(
    ParseFieldError,
    (bstr::Utf8Error, ParseFieldError::Utf8Error),
    (
        std::num::ParseIntError,
        ParseFieldError::ParseFromStringError
    ),
);

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseFieldError as PFE;
        match self {
            PFE::Utf8Error => {
                write!(f, "Field is not valid UTF-8")
            }
            PFE::ParseFromStringError => {
                write!(f, "Field is not a valid number")
            }
            PFE::InvalidField(field) => {
                write!(f, "Malformed `{}` column", field)
            }
            PFE::MissingScore(tag) => write!(
                f,
                "Alignment score tag `{}{}:i` is missing",
                char::from(tag[0]),
                char::from(tag[1])
            ),
            PFE::MissingFields => write!(f, "Too few columns"),
        }
    }
}

impl error::Error for ParseFieldError {}

/// Type encapsulating the errors raised while reading alignments or
/// sequence records
#[derive(Debug)]
pub enum ParseError {
    /// Blank line; always skippable.
    EmptyLine,
    /// The record did not align. Skipped by the reader rather than a
    /// fail condition.
    Unmapped,
    /// A SAM line was rejected; carries the offending line.
    InvalidLine(ParseFieldError, String),
    /// A field failed before the line was known.
    InvalidField(ParseFieldError),
    /// Sequence content was neither FASTA nor FASTQ.
    UnknownFormat,
    /// A FASTA/FASTQ record was cut short or malformed.
    InvalidRecord(String),
    /// Two sequence records share an identifier.
    DuplicateId(BString),
    IOError(std::io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseError as PE;
        match self {
            PE::EmptyLine => write!(f, "Line was empty"),
            PE::Unmapped => write!(f, "Record is unmapped"),
            PE::InvalidLine(field_err, line) => {
                write!(f, "{} in SAM line `{}`", field_err, line)
            }
            PE::InvalidField(field_err) => {
                write!(f, "Bad field: {}", field_err)
            }
            PE::UnknownFormat => {
                write!(f, "Sequence content is neither FASTA nor FASTQ")
            }
            PE::InvalidRecord(header) => {
                write!(f, "Malformed sequence record `{}`", header)
            }
            PE::DuplicateId(id) => {
                write!(f, "Duplicate sequence identifier `{}`", id)
            }
            PE::IOError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl From<std::io::Error> for ParseError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl From<ParseFieldError> for ParseError {
    #[inline]
    fn from(err: ParseFieldError) -> Self {
        Self::InvalidField(err)
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ParseError::IOError(err) => Some(err),
            ParseError::InvalidLine(err, _) => Some(err),
            ParseError::InvalidField(err) => Some(err),
            _ => None,
        }
    }
}

impl ParseError {
    #[inline]
    pub(crate) fn invalid_line(error: ParseFieldError, line: &[u8]) -> Self {
        Self::InvalidLine(error, line.to_str_lossy().into_owned())
    }

    #[inline]
    pub(crate) fn invalid_record(header: &[u8]) -> Self {
        Self::InvalidRecord(header.to_str_lossy().into_owned())
    }

    #[inline]
    pub fn can_safely_continue(&self, tol: &ParserTolerance) -> bool {
        use ParserTolerance as Tol;
        match tol {
            Tol::IgnoreAll => !matches!(self, ParseError::IOError(_)),
            Tol::Safe => {
                matches!(self, ParseError::EmptyLine | ParseError::Unmapped)
            }
            Tol::Pedantic => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_levels() {
        let empty = ParseError::EmptyLine;
        let unmapped = ParseError::Unmapped;
        let bad = ParseError::invalid_line(
            ParseFieldError::InvalidField("POS"),
            b"r1\t0\tr2\tx",
        );

        assert!(empty.can_safely_continue(&ParserTolerance::Safe));
        assert!(unmapped.can_safely_continue(&ParserTolerance::Safe));
        assert!(!bad.can_safely_continue(&ParserTolerance::Safe));
        assert!(bad.can_safely_continue(&ParserTolerance::IgnoreAll));
        assert!(!empty.can_safely_continue(&ParserTolerance::Pedantic));
    }

    #[test]
    fn messages_name_the_problem() {
        let err = ParseError::from(ParseFieldError::MissingScore(*b"AS"));
        assert_eq!(
            err.to_string(),
            "Bad field: Alignment score tag `AS:i` is missing"
        );

        let err = ParseError::DuplicateId("read7".into());
        assert_eq!(err.to_string(), "Duplicate sequence identifier `read7`");
    }
}
