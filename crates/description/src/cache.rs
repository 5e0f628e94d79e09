// standard library
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// crate modules
use crate::channel::{ChannelDescriptor, ChannelType, SamplingType};
use crate::error::{Error, Result};
use crate::parsers::{self, Element};

// external crates
use log::{debug, info, trace};

/// Native time unit of the cache format, ticks per second
pub const TICKS_PER_SECOND: f64 = 6000.0;

/// Layout of the data files on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheType {
    /// Every sample block lives in a single `<base>.mc` file
    OneFile,
    /// One `<base>Frame<N>[Tick<M>].mc` file per sample
    OneFilePerFrame,
    /// Anything else, rejected when a conversion is attempted
    Unknown(String),
}

impl Default for CacheType {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl FromStr for CacheType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Ok(match s {
            "OneFile" => Self::OneFile,
            "OneFilePerFrame" => Self::OneFilePerFrame,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OneFile => write!(f, "OneFile"),
            Self::OneFilePerFrame => write!(f, "OneFilePerFrame"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Cache level information from a description document
///
/// The description is a small XML document sitting next to the data files.
///
/// ```text
/// <Autodesk_Cache_File>
///   <cacheType Type="OneFile" Format="mcc"/>
///   <time Range="250-1000"/>
///   <cacheTimePerFrame TimePerFrame="250"/>
///   <cacheVersion Version="2.0"/>
///   <Channels>
///     <channel0 ChannelName="..." ChannelType="FloatVectorArray" .../>
///   </Channels>
/// </Autodesk_Cache_File>
/// ```
///
/// Cache level values are taken from the first attribute of each element,
/// whatever it happens to be called.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheDescriptor {
    /// File name of the description up to the first `.`
    pub base_name: String,
    /// Directory holding the description and data files
    pub directory: PathBuf,
    /// Resolved path to the description document
    pub path: PathBuf,
    /// Layout of the data files
    pub cache_type: CacheType,
    /// Start of the cached range in ticks
    pub start_time: i32,
    /// End of the cached range in ticks
    pub end_time: i32,
    /// Ticks per frame, used to recover times from per-frame file names
    pub time_per_frame: i32,
    /// Cache format version
    pub version: f64,
    /// Channels in document order
    pub channels: Vec<ChannelDescriptor>,
}

impl CacheDescriptor {
    /// Read a cache description file
    ///
    /// A bare file name is looked up in the current working directory, with
    /// `.xml` appended if the name alone does not exist. Paths with a
    /// directory component are used as given.
    ///
    /// ```rust, no_run
    /// # use mctools_description::CacheDescriptor;
    /// let cache = CacheDescriptor::from_file("/path/to/cache.xml").unwrap();
    /// println!("{cache}");
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = resolve_path(path.as_ref())?;
        info!("Reading {}", path.display());
        let document = std::fs::read_to_string(&path)?;
        Self::from_document(&document, path)
    }

    /// Parse a description document as if it were read from `path`
    pub fn from_document<P: Into<PathBuf>>(document: &str, path: P) -> Result<Self> {
        let path = path.into();
        let root = parsers::document(document)?;
        trace!("Root element <{}>", root.name);

        let base_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();

        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut cache = Self {
            base_name,
            directory,
            path,
            ..Default::default()
        };

        for node in &root.children {
            let first = node.first_attribute().unwrap_or_default();
            match node.name.as_str() {
                "cacheType" => cache.cache_type = CacheType::from_str(first).unwrap_or_default(),
                "time" => (cache.start_time, cache.end_time) = parsers::time_range(first)?,
                "cacheTimePerFrame" => cache.time_per_frame = number(first, "cacheTimePerFrame")?,
                "cacheVersion" => cache.version = number(first, "cacheVersion")?,
                "Channels" => cache.channels = parse_channels(node)?,
                _ => {}
            }
        }

        debug!(
            "{} cache with {} channels, version {}",
            cache.cache_type,
            cache.channels.len(),
            cache.version
        );
        Ok(cache)
    }

    /// Find a channel by name
    pub fn channel(&self, name: &str) -> Option<&ChannelDescriptor> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Path of the single data file for [CacheType::OneFile] caches
    pub fn data_file(&self) -> PathBuf {
        self.directory.join(format!("{}.mc", self.base_name))
    }

    /// Convert a time in ticks to seconds
    pub fn seconds(ticks: i32) -> f64 {
        ticks as f64 / TICKS_PER_SECOND
    }
}

impl fmt::Display for CacheDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cache {} {{", self.base_name)?;
        writeln!(f, "    type: {}", self.cache_type)?;
        writeln!(f, "    version: {}", self.version)?;
        writeln!(f, "    time: {}-{} ticks", self.start_time, self.end_time)?;
        writeln!(f, "    time per frame: {} ticks", self.time_per_frame)?;
        for channel in &self.channels {
            writeln!(f, "    channel: {channel}")?;
        }
        write!(f, "}}")
    }
}

/// Find the description file on disk
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let has_directory = path.parent().is_some_and(|p| !p.as_os_str().is_empty());
    if has_directory {
        return match path.exists() {
            true => Ok(path.to_path_buf()),
            false => Err(Error::MissingFile(path.to_path_buf())),
        };
    }

    let full_path = std::env::current_dir()?.join(path);
    if full_path.exists() {
        return Ok(full_path);
    }

    let mut with_extension = full_path.into_os_string();
    with_extension.push(".xml");
    let with_extension = PathBuf::from(with_extension);
    match with_extension.exists() {
        true => Ok(with_extension),
        false => Err(Error::MissingFile(with_extension)),
    }
}

/// Collect every `channel*` child of the `Channels` element
fn parse_channels(channels: &Element) -> Result<Vec<ChannelDescriptor>> {
    channels
        .children
        .iter()
        .filter(|node| node.name.starts_with("channel"))
        .map(parse_channel)
        .collect()
}

fn parse_channel(node: &Element) -> Result<ChannelDescriptor> {
    let text = |key: &str| node.attribute(key).unwrap_or_default();
    let int = |key: &str| match node.attribute(key) {
        Some(value) => number(value, key),
        None => Ok(0),
    };

    Ok(ChannelDescriptor {
        name: text("ChannelName").to_string(),
        channel_type: ChannelType::from_str(text("ChannelType")).unwrap_or_default(),
        interpretation: text("ChannelInterpretation").to_string(),
        sampling_type: SamplingType::from_str(text("SamplingType")).unwrap_or_default(),
        sampling_rate: int("SamplingRate")?,
        start_time: int("StartTime")?,
        end_time: int("EndTime")?,
    })
}

/// Parse a numeric attribute value
fn number<T: FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid(format!("{key} value {value:?} is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"<?xml version="1.0"?>
<Autodesk_Cache_File>
  <cacheType Type="OneFilePerFrame" Format="mcc"/>
  <time Range="250-1000"/>
  <cacheTimePerFrame TimePerFrame="250"/>
  <cacheVersion Version="2.0"/>
  <Channels>
    <channel0 ChannelName="shape_points" ChannelType="FloatVectorArray" ChannelInterpretation="positions" SamplingType="Regular" SamplingRate="250" StartTime="250" EndTime="1000"/>
    <extra Name="ignored"/>
  </Channels>
</Autodesk_Cache_File>
"#;

    #[test]
    fn test_from_document() {
        let cache = CacheDescriptor::from_document(DOCUMENT, "/tmp/caches/shape.xml").unwrap();
        assert_eq!(cache.base_name, "shape");
        assert_eq!(cache.directory, PathBuf::from("/tmp/caches"));
        assert_eq!(cache.cache_type, CacheType::OneFilePerFrame);
        assert_eq!((cache.start_time, cache.end_time), (250, 1000));
        assert_eq!(cache.time_per_frame, 250);
        assert_eq!(cache.version, 2.0);
        assert_eq!(cache.channels.len(), 1);
        assert!(cache.channel("shape_points").unwrap().is_float_vector_array());
        assert_eq!(cache.data_file(), PathBuf::from("/tmp/caches/shape.mc"));
    }

    #[test]
    fn test_unknown_cache_type_is_kept() {
        let doc = DOCUMENT.replace("OneFilePerFrame", "Mystery");
        let cache = CacheDescriptor::from_document(&doc, "shape.xml").unwrap();
        assert_eq!(cache.cache_type, CacheType::Unknown("Mystery".to_string()));
        assert_eq!(cache.directory, PathBuf::from("."));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let doc = "<Autodesk_Cache_File><time Range=\"-250-0\"/></Autodesk_Cache_File>";
        let cache = CacheDescriptor::from_document(doc, "shape.xml").unwrap();
        assert_eq!(cache.cache_type, CacheType::Unknown(String::new()));
        assert_eq!(CacheType::default(), CacheType::Unknown(String::new()));
        assert_eq!((cache.start_time, cache.end_time), (-250, 0));
        assert_eq!(cache.version, 0.0);
        assert!(cache.channels.is_empty());
    }

    #[test]
    fn test_bad_numbers() {
        let doc = DOCUMENT.replace("TimePerFrame=\"250\"", "TimePerFrame=\"fast\"");
        assert!(matches!(
            CacheDescriptor::from_document(&doc, "shape.xml"),
            Err(Error::InvalidDescription { .. })
        ));
    }

    #[test]
    fn test_seconds() {
        assert_eq!(CacheDescriptor::seconds(6000), 1.0);
        assert_eq!(CacheDescriptor::seconds(250), 250.0 / 6000.0);
    }
}
