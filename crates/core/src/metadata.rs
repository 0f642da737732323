//! RTMP `onMetaData` codec identifiers (FLV `videocodecid` / `audiocodecid`).
//!
//! Publishers describe their tracks either with a FourCC string or with
//! the numeric FLV codec id:
//!
//! | Codec | String | Number (FLV v10.1 §E.4.3 / §E.4.2) |
//! |-------|--------|---------------------------------|
//! | H.264 | `avc1` | 7 |
//! | AAC   | `mp4a` | 10 |
//!
//! Adding a mapping is one line in [`STRING_CODECS`] or [`NUMERIC_CODECS`].

use std::fmt;

use crate::codec::CodecId;

/// FourCC strings accepted in metadata.
pub const STRING_CODECS: &[(&str, CodecId)] = &[("avc1", CodecId::H264), ("mp4a", CodecId::Aac)];

/// Numeric FLV codec ids accepted in metadata.
pub const NUMERIC_CODECS: &[(i64, CodecId)] = &[(7, CodecId::H264), (10, CodecId::Aac)];

/// AMF value as produced by the metadata decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    Undefined,
}

impl AmfValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of a numeric value. AMF0 numbers are doubles, so they
    /// are truncated the way the metadata decoder does.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Number(n) => Some(n as i64),
            Self::Integer(i) => Some(i),
            Self::Boolean(b) => Some(i64::from(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }
}

impl From<&str> for AmfValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl fmt::Display for AmfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Null => write!(f, "null"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// Outcome of looking a metadata value up in the codec tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Codec(CodecId),
    UnknownString(String),
    UnknownNumber(i64),
    /// Null/undefined: no track of this kind in the metadata.
    Absent,
}

/// Look a metadata codec value up in [`STRING_CODECS`] / [`NUMERIC_CODECS`].
pub fn lookup(value: &AmfValue) -> Lookup {
    if value.is_null() {
        return Lookup::Absent;
    }
    if let Some(name) = value.as_str() {
        return STRING_CODECS
            .iter()
            .find(|(s, _)| *s == name)
            .map_or_else(|| Lookup::UnknownString(name.to_string()), |&(_, c)| Lookup::Codec(c));
    }
    match value.as_integer() {
        Some(id) => NUMERIC_CODECS
            .iter()
            .find(|(n, _)| *n == id)
            .map_or(Lookup::UnknownNumber(id), |&(_, c)| Lookup::Codec(c)),
        None => Lookup::Absent,
    }
}

/// Metadata value advertised for a codec. Only codecs with a FourCC entry
/// in [`STRING_CODECS`] have one; H.265 maps to `Null`.
pub fn metadata_from_codec_id(codec: CodecId) -> AmfValue {
    STRING_CODECS
        .iter()
        .find(|(_, c)| *c == codec)
        .map_or(AmfValue::Null, |&(s, _)| AmfValue::from(s))
}
