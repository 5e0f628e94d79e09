//! Module for reading and converting Maya .mc cache data files
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod array;
mod chunk;
mod convert;
mod error;
mod frame;
mod inspect;
mod record;
mod transcode;

// Inline anything important for a nice public API
#[doc(inline)]
pub use chunk::{host_swap_policy, padded_length, ChunkReader, ChunkWriter, Tag};

#[doc(inline)]
pub use array::{widen_to_double, VectorArray};

#[doc(inline)]
pub use record::{
    for_each_block, BlockLayout, CacheHeader, ChannelRecord, SampleBlock, SampleTime,
};

#[doc(inline)]
pub use frame::{discover_frame_files, FrameName};

#[doc(inline)]
pub use transcode::{
    transcode_one_file, transcode_per_frame, transcode_stream, ConvertOptions, FileReport,
    SampleReport, TranscodeReport,
};

#[doc(inline)]
pub use inspect::{
    inspect_cache, inspect_file, inspect_stream, CacheSummary, ChannelSummary, SampleSummary,
};

#[doc(inline)]
pub use convert::{convert_cache, MAX_SUPPORTED_VERSION};

#[doc(inline)]
pub use error::{Error, Result};
