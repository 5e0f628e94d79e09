//! Module for reading and rewriting Maya cache description files
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cache;
mod channel;
mod error;
mod parsers;
mod rewrite;

// Inline anything important for a nice public API
#[doc(inline)]
pub use cache::{CacheDescriptor, CacheType, TICKS_PER_SECOND};

#[doc(inline)]
pub use channel::{
    ChannelDescriptor, ChannelType, SamplingType, DOUBLE_VECTOR_ARRAY, FLOAT_VECTOR_ARRAY,
};

#[doc(inline)]
pub use rewrite::{convert_description_text, write_converted_description};

#[doc(inline)]
pub use error::{Error, Result};
