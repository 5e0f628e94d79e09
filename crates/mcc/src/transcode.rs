//! Conversion of data files from float to double vector arrays

// standard library
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

// crate modules
use crate::chunk::{host_swap_policy, ChunkReader, ChunkWriter};
use crate::error::{Error, Result};
use crate::frame::{discover_frame_files, is_output_of, FrameName};
use crate::record::{for_each_block, BlockLayout, CacheHeader};

// external crates
use kdam::{par_tqdm, BarBuilder, BarExt};
use log::{debug, info, warn};
use mctools_description::CacheDescriptor;
use rayon::prelude::*;

/// Run configuration for a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Byte swap integers and array values, see [host_swap_policy()]
    pub swap_bytes: bool,
    /// Convert per-frame files on the rayon thread pool
    pub parallel: bool,
    /// Show a progress bar for per-frame conversions
    pub progress: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            swap_bytes: host_swap_policy(),
            parallel: false,
            progress: false,
        }
    }
}

/// What happened to one sample block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// Sample time, `None` for blocks without a `TIME` record
    pub ticks: Option<i32>,
    /// Number of channel records in the block
    pub channels: usize,
    /// Number of those widened from `FVCA` to `DVCA`
    pub converted: usize,
    /// Block length declared in the input
    pub length_in: usize,
    /// Block length written to the output
    pub length_out: usize,
}

/// Conversion summary for a single data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Data file that was read
    pub input: PathBuf,
    /// Data file that was written
    pub output: PathBuf,
    /// Sample time derived from a per-frame file name
    pub ticks: Option<i32>,
    /// Every sample block in file order
    pub samples: Vec<SampleReport>,
}

/// Conversion summary for a whole cache
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscodeReport {
    /// Files in time order
    pub files: Vec<FileReport>,
}

impl TranscodeReport {
    /// Total number of sample blocks converted
    pub fn samples(&self) -> usize {
        self.files.iter().map(|f| f.samples.len()).sum()
    }

    /// Total number of channel records widened to double precision
    pub fn converted_channels(&self) -> usize {
        self.samples_iter().map(|s| s.converted).sum()
    }

    /// Total number of bytes added to the sample blocks
    pub fn bytes_added(&self) -> usize {
        self.samples_iter().map(|s| s.length_out - s.length_in).sum()
    }

    fn samples_iter(&self) -> impl Iterator<Item = &SampleReport> {
        self.files.iter().flat_map(|f| f.samples.iter())
    }
}

/// Convert a complete data stream
///
/// The header group is copied through unchanged. Every following sample
/// block is decoded, its `FVCA` channels are widened to `DVCA`, and it is
/// written back out with its length recomputed. Everything else, including
/// name padding, is reproduced exactly.
///
/// Only one sample block is held in memory at a time. On error the output
/// holds whatever was written before the failure.
pub fn transcode_stream<R: Read, W: Write>(
    input: R,
    output: W,
    layout: BlockLayout,
    swap_bytes: bool,
) -> Result<Vec<SampleReport>> {
    let mut reader = ChunkReader::new(input, swap_bytes);
    let mut writer = ChunkWriter::new(output, swap_bytes);

    CacheHeader::decode(&mut reader)?.encode(&mut writer)?;

    let mut reports = Vec::new();
    for_each_block(&mut reader, layout, |block, length_in| {
        let ticks = block.time.map(|t| t.ticks);
        if let Some(ticks) = ticks {
            info!(
                "Converting data at time {} seconds",
                CacheDescriptor::seconds(ticks)
            );
        }

        let channels = block.channels.len();
        let converted = block.float_channels();
        let block = block.into_double();
        let length_out = block.encoded_len();
        block.encode(&mut writer)?;

        debug!("Block of {length_in} bytes written as {length_out} bytes");
        reports.push(SampleReport {
            ticks,
            channels,
            converted,
            length_in,
            length_out,
        });
        Ok(())
    })?;

    writer.finish()?;
    Ok(reports)
}

/// Convert the `<base>.mc` data file of a [OneFile] cache
///
/// Writes `<output_base>.mc` next to the input.
///
/// [OneFile]: mctools_description::CacheType::OneFile
pub fn transcode_one_file(
    cache: &CacheDescriptor,
    output_base: &str,
    options: &ConvertOptions,
) -> Result<TranscodeReport> {
    let input = cache.data_file();
    if !input.is_file() {
        return Err(Error::MissingFile(input));
    }

    let output = cache.directory.join(format!("{output_base}.mc"));
    if output == input {
        return Err(Error::OutputOverwritesInput(output));
    }

    let samples = transcode_file(&input, &output, BlockLayout::WithTime, options.swap_bytes)?;
    info!("Converted {} samples", samples.len());

    Ok(TranscodeReport {
        files: vec![FileReport {
            input,
            output,
            ticks: None,
            samples,
        }],
    })
}

/// Convert every `<base>Frame<N>[Tick<M>].mc` file of a [OneFilePerFrame] cache
///
/// Each frame is written to `<output_base>Frame<N>[Tick<M>].mc` in the same
/// directory. All file names are checked before anything is written, so an
/// unparseable name or two frames sharing an output fail the conversion
/// without partial output.
///
/// Files are independent, so with `options.parallel` they are converted on
/// the rayon thread pool. The report is sorted by sample time either way.
///
/// [OneFilePerFrame]: mctools_description::CacheType::OneFilePerFrame
pub fn transcode_per_frame(
    cache: &CacheDescriptor,
    output_base: &str,
    options: &ConvertOptions,
) -> Result<TranscodeReport> {
    let frames = plan_frames(cache, output_base)?;
    transcode_frames(&frames, options)
}

/// Input and output paths of one per-frame file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FramePlan {
    input: PathBuf,
    output: PathBuf,
    ticks: i32,
}

/// Resolve the output path and sample time of every frame file
///
/// Fails if a name does not parse or if two frames would be written to the
/// same file. Earlier outputs of the same conversion are skipped, so no
/// output can replace an input.
pub(crate) fn plan_frames(cache: &CacheDescriptor, output_base: &str) -> Result<Vec<FramePlan>> {
    let mut frames = Vec::new();
    for input in discover_frame_files(&cache.directory, &cache.base_name)? {
        if is_output_of(&input, output_base) {
            warn!("Skipping {}, output of this conversion", input.display());
            continue;
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = FrameName::parse(&stem)?;
        let ticks = name.ticks(cache.time_per_frame)?;
        let output = cache.directory.join(name.output_file_name(output_base));
        frames.push(FramePlan {
            input,
            output,
            ticks,
        });
    }

    let mut outputs = HashSet::new();
    for frame in &frames {
        if !outputs.insert(&frame.output) {
            return Err(Error::DuplicateFrameOutput(frame.output.clone()));
        }
    }

    debug!("Planned {} frame files", frames.len());
    Ok(frames)
}

/// Convert frame files that have already been checked by [plan_frames()]
pub(crate) fn transcode_frames(
    frames: &[FramePlan],
    options: &ConvertOptions,
) -> Result<TranscodeReport> {
    info!("Converting {} frame files", frames.len());

    let convert = |frame: &FramePlan| -> Result<FileReport> {
        info!(
            "Converting data at time {} seconds",
            CacheDescriptor::seconds(frame.ticks)
        );
        let samples = transcode_file(
            &frame.input,
            &frame.output,
            BlockLayout::WithoutTime,
            options.swap_bytes,
        )?;
        Ok(FileReport {
            input: frame.input.clone(),
            output: frame.output.clone(),
            ticks: Some(frame.ticks),
            samples,
        })
    };

    let mut files = if options.parallel {
        par_tqdm!(
            frames.par_iter().map(convert),
            bar_format = "Converting frames: {count}/{total} [{rate:.2} files/s]  ",
            disable = !options.progress
        )
        .collect::<Result<Vec<FileReport>>>()?
    } else {
        let mut progress_bar = BarBuilder::default()
            .total(frames.len())
            .disable(!options.progress)
            .bar_format("Converting frames: {count}/{total} [{rate:.2} files/s]  ")
            .build()
            .map_err(std::io::Error::other)?;

        let mut files = Vec::with_capacity(frames.len());
        for frame in frames {
            files.push(convert(frame)?);
            progress_bar.update(1)?;
        }
        files
    };

    if options.progress {
        eprintln!();
    }

    files.sort_by_key(|f| f.ticks);
    Ok(TranscodeReport { files })
}

/// Buffered file to file conversion
fn transcode_file(
    input: &Path,
    output: &Path,
    layout: BlockLayout,
    swap_bytes: bool,
) -> Result<Vec<SampleReport>> {
    info!("Writing {}", output.display());
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    transcode_stream(reader, writer, layout, swap_bytes)
}
