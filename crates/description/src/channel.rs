// standard library
use std::fmt;
use std::str::FromStr;

/// Literal used by the description for single-precision vector arrays
pub const FLOAT_VECTOR_ARRAY: &str = "FloatVectorArray";

/// Literal used by the description for double-precision vector arrays
pub const DOUBLE_VECTOR_ARRAY: &str = "DoubleVectorArray";

/// Declared data type of a channel
///
/// Only the vector array types matter for conversion, anything else is kept
/// as the literal string found in the description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelType {
    /// Single-precision `(x,y,z)` triples, `FVCA` in the data files
    FloatVectorArray,
    /// Double-precision `(x,y,z)` triples, `DVCA` in the data files
    #[default]
    DoubleVectorArray,
    /// Any other channel type, passed through untouched
    Other(String),
}

impl FromStr for ChannelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            FLOAT_VECTOR_ARRAY => Self::FloatVectorArray,
            DOUBLE_VECTOR_ARRAY => Self::DoubleVectorArray,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FloatVectorArray => write!(f, "{FLOAT_VECTOR_ARRAY}"),
            Self::DoubleVectorArray => write!(f, "{DOUBLE_VECTOR_ARRAY}"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// How samples of a channel are spaced in time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SamplingType {
    /// Samples every `sampling_rate` ticks
    #[default]
    Regular,
    /// Samples at arbitrary times
    Irregular,
    /// Unrecognised sampling type, kept verbatim
    Other(String),
}

impl FromStr for SamplingType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "regular" => Self::Regular,
            "irregular" => Self::Irregular,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl fmt::Display for SamplingType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "Regular"),
            Self::Irregular => write!(f, "Irregular"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Description of one named stream of data in the cache
///
/// Built from a `channel*` element of the description document, e.g.
///
/// ```text
/// <channel0 ChannelName="pointShape1_points" ChannelType="FloatVectorArray"
///     ChannelInterpretation="positions" SamplingType="Regular"
///     SamplingRate="250" StartTime="250" EndTime="1000"/>
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelDescriptor {
    /// Channel name, unique within the cache
    pub name: String,
    /// Declared data type
    pub channel_type: ChannelType,
    /// Interpretation of the data (`positions`, `velocity`, ...)
    pub interpretation: String,
    /// Regular or irregular sampling
    pub sampling_type: SamplingType,
    /// Ticks between samples, only meaningful for regular sampling
    pub sampling_rate: i32,
    /// First sample time in ticks
    pub start_time: i32,
    /// Last sample time in ticks
    pub end_time: i32,
}

impl ChannelDescriptor {
    /// True for channels stored as single-precision vector arrays
    pub fn is_float_vector_array(&self) -> bool {
        self.channel_type == ChannelType::FloatVectorArray
    }
}

impl fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {} {}, {}-{})",
            self.name,
            self.channel_type,
            self.interpretation,
            self.sampling_type,
            self.sampling_rate,
            self.start_time,
            self.end_time
        )
    }
}
