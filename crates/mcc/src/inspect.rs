//! Read-only summaries of data files

// standard library
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

// crate modules
use crate::chunk::{ChunkReader, Tag};
use crate::error::{Error, Result};
use crate::frame::discover_frame_files;
use crate::record::{for_each_block, BlockLayout, CacheHeader};

// external crates
use mctools_description::{CacheDescriptor, CacheType};

/// One channel record, without its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    /// Channel name
    pub name: String,
    /// Data format, `FVCA` or `DVCA`
    pub format: Tag,
    /// Number of `(x,y,z)` vectors
    pub element_count: i32,
}

/// One sample block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    /// Sample time, `None` for per-frame files
    pub ticks: Option<i32>,
    /// Declared block length
    pub length: usize,
    /// Channels in file order
    pub channels: Vec<ChannelSummary>,
}

/// Structure of a complete data file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheSummary {
    /// Length of the header group
    pub header_length: usize,
    /// Header records such as `VRSN` and `STIM`, when recognisable
    pub header_records: Vec<(Tag, Vec<u8>)>,
    /// Sample blocks in file order
    pub samples: Vec<SampleSummary>,
}

impl CacheSummary {
    /// Number of channel records stored as single precision
    pub fn float_channels(&self) -> usize {
        self.samples
            .iter()
            .flat_map(|s| s.channels.iter())
            .filter(|c| c.format == Tag::FVCA)
            .count()
    }
}

impl fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "header: {} bytes", self.header_length)?;
        for (tag, data) in &self.header_records {
            writeln!(f, "  {tag}: {}", String::from_utf8_lossy(data).trim_end_matches('\0'))?;
        }
        for sample in &self.samples {
            match sample.ticks {
                Some(t) => writeln!(f, "sample at {t} ticks: {} bytes", sample.length)?,
                None => writeln!(f, "sample: {} bytes", sample.length)?,
            }
            for c in &sample.channels {
                writeln!(f, "  {} {} x{}", c.name, c.format, c.element_count)?;
            }
        }
        Ok(())
    }
}

/// Walk a data stream without writing anything
///
/// Decoding is shared with the transcoder, so a stream fails here at the
/// same offset a conversion would.
pub fn inspect_stream<R: Read>(
    input: R,
    layout: BlockLayout,
    swap_bytes: bool,
) -> Result<CacheSummary> {
    let mut reader = ChunkReader::new(input, swap_bytes);
    let header = CacheHeader::decode(&mut reader)?;

    let mut samples = Vec::new();
    for_each_block(&mut reader, layout, |block, length| {
        samples.push(SampleSummary {
            ticks: block.time.map(|t| t.ticks),
            length,
            channels: block
                .channels
                .iter()
                .map(|c| ChannelSummary {
                    name: c.name(),
                    format: c.data.tag(),
                    element_count: c.element_count,
                })
                .collect(),
        });
        Ok(())
    })?;

    Ok(CacheSummary {
        header_length: header.bytes.len(),
        header_records: header.records(swap_bytes),
        samples,
    })
}

/// Summarise the data file at `path`
///
/// ```rust, no_run
/// # use mctools_mcc::{inspect_file, BlockLayout};
/// let summary = inspect_file("/path/to/cache.mc", BlockLayout::WithTime, true).unwrap();
/// println!("{summary}");
/// ```
pub fn inspect_file<P: AsRef<Path>>(
    path: P,
    layout: BlockLayout,
    swap_bytes: bool,
) -> Result<CacheSummary> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    inspect_stream(BufReader::new(File::open(path)?), layout, swap_bytes)
}

/// Summarise every data file belonging to a cache
///
/// Single file caches give one entry, per-frame caches one per discovered
/// frame file in name order.
pub fn inspect_cache(
    cache: &CacheDescriptor,
    swap_bytes: bool,
) -> Result<Vec<(PathBuf, CacheSummary)>> {
    let (files, layout) = match &cache.cache_type {
        CacheType::OneFile => (vec![cache.data_file()], BlockLayout::WithTime),
        CacheType::OneFilePerFrame => (
            discover_frame_files(&cache.directory, &cache.base_name)?,
            BlockLayout::WithoutTime,
        ),
        CacheType::Unknown(name) => return Err(Error::UnknownCacheType(name.clone())),
    };

    files
        .into_iter()
        .map(|path| {
            let summary = inspect_file(&path, layout, swap_bytes)?;
            Ok((path, summary))
        })
        .collect()
}
