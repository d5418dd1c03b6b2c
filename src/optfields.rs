use bstr::{BString, ByteSlice};

use lazy_static::lazy_static;
use regex::bytes::Regex;

/// A SAM optional field, `TAG:TYPE:VALUE`
#[derive(Debug, Clone, PartialEq)]
pub struct OptField {
    pub tag: [u8; 2],
    pub value: OptFieldVal,
}

/// The typed value of an optional field. Integer arrays keep their
/// element subtype (`c`, `C`, `s`, `S`, `i` or `I`).
#[derive(Debug, Clone, PartialEq)]
pub enum OptFieldVal {
    A(u8),
    Int(i64),
    Float(f32),
    Z(BString),
    H(Vec<u8>),
    BInt(u8, Vec<i64>),
    BFloat(Vec<f32>),
}

lazy_static! {
    static ref RE_FIELD: Regex =
        Regex::new(r"(?-u)^([A-Za-z][A-Za-z0-9]):([AifZHB]):(.*)$").unwrap();
    static ref RE_INT: Regex = Regex::new(r"(?-u)^[-+]?[0-9]+$").unwrap();
    static ref RE_FLOAT: Regex =
        Regex::new(r"(?-u)^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$").unwrap();
    static ref RE_PRINTABLE: Regex = Regex::new(r"(?-u)^[ !-~]*$").unwrap();
    static ref RE_HEX: Regex =
        Regex::new(r"(?-u)^([0-9A-F][0-9A-F])*$").unwrap();
}

fn parse_num<T: std::str::FromStr>(bytes: &[u8]) -> Option<T> {
    bytes.to_str().ok()?.parse().ok()
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    if RE_INT.is_match(bytes) {
        parse_num(bytes)
    } else {
        None
    }
}

fn parse_float(bytes: &[u8]) -> Option<f32> {
    if RE_FLOAT.is_match(bytes) {
        parse_num(bytes)
    } else {
        None
    }
}

impl OptFieldVal {
    fn parse(field_type: u8, contents: &[u8]) -> Option<Self> {
        use OptFieldVal::*;
        match field_type {
            b'A' if contents.len() == 1 && contents[0].is_ascii_graphic() => {
                Some(A(contents[0]))
            }
            b'i' => parse_int(contents).map(Int),
            b'f' => parse_float(contents).map(Float),
            b'Z' if RE_PRINTABLE.is_match(contents) => Some(Z(contents.into())),
            b'H' if RE_HEX.is_match(contents) => contents
                .chunks(2)
                .map(|pair| u8::from_str_radix(pair.to_str().ok()?, 16).ok())
                .collect::<Option<Vec<_>>>()
                .map(H),
            b'B' => {
                let (&subtype, rest) = contents.split_first()?;
                if rest.first().map_or(false, |&b| b != b',') {
                    return None;
                }
                let elems = rest.split_str(b",").skip(1);
                match subtype {
                    b'f' => elems
                        .map(parse_float)
                        .collect::<Option<Vec<_>>>()
                        .map(BFloat),
                    b'c' | b'C' | b's' | b'S' | b'i' | b'I' => elems
                        .map(parse_int)
                        .collect::<Option<Vec<_>>>()
                        .map(|xs| BInt(subtype, xs)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl OptField {
    /// Returns None if the provided tag doesn't match [A-Za-z][A-Za-z0-9]
    pub fn tag(t: &[u8]) -> Option<[u8; 2]> {
        match t {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => {
                Some([*a, *b])
            }
            _ => None,
        }
    }

    pub fn new(tag: [u8; 2], value: OptFieldVal) -> Self {
        OptField { tag, value }
    }

    /// Parses an optional field from a bytestring in the format
    /// <TAG>:<TYPE>:<VALUE>. Unknown types and malformed values yield
    /// None.
    pub fn parse(input: &[u8]) -> Option<Self> {
        let caps = RE_FIELD.captures(input)?;
        let tag = Self::tag(caps.get(1)?.as_bytes())?;
        let field_type = caps.get(2)?.as_bytes()[0];
        let value = OptFieldVal::parse(field_type, caps.get(3)?.as_bytes())?;
        Some(Self::new(tag, value))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            OptFieldVal::Int(x) => Some(x),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use OptFieldVal::*;

        write!(f, "{}:", self.tag.as_bstr())?;
        match &self.value {
            A(x) => write!(f, "A:{}", char::from(*x)),
            Int(x) => write!(f, "i:{}", x),
            Float(x) => write!(f, "f:{}", x),
            Z(x) => write!(f, "Z:{}", x),
            H(x) => {
                f.write_str("H:")?;
                x.iter().try_for_each(|b| write!(f, "{:02X}", b))
            }
            BInt(sub, x) => {
                write!(f, "B:{}", char::from(*sub))?;
                x.iter().try_for_each(|v| write!(f, ",{}", v))
            }
            BFloat(x) => {
                f.write_str("B:f")?;
                x.iter().try_for_each(|v| write!(f, ",{}", v))
            }
        }
    }
}

/// The optional fields trailing a SAM record, in file order.
/// Fields that don't parse are dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptFields(Vec<OptField>);

impl OptFields {
    pub fn parse<T>(input: T) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<[u8]>,
    {
        OptFields(
            input
                .into_iter()
                .filter_map(|f| OptField::parse(f.as_ref()))
                .collect(),
        )
    }

    /// The first field carrying `tag`.
    pub fn get(&self, tag: &[u8]) -> Option<&OptField> {
        self.0.iter().find(|o| o.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptField> {
        self.0.iter()
    }
}
