//! Write operations for converted description files

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

// crate modules
use crate::cache::CacheDescriptor;
use crate::channel::{DOUBLE_VECTOR_ARRAY, FLOAT_VECTOR_ARRAY};
use crate::error::{Error, Result};

// external crates
use log::{debug, info};

/// Write a description file for the double-precision version of a cache
///
/// Copies the document at `cache.path` line by line to
/// `<directory>/<output_base>.xml`, replacing every `FloatVectorArray` with
/// `DoubleVectorArray`. Everything else, including line endings, is written
/// back exactly as it was read.
///
/// Returns the path of the new document.
///
/// ```rust, no_run
/// # use mctools_description::{write_converted_description, CacheDescriptor};
/// let cache = CacheDescriptor::from_file("/path/to/cache.xml").unwrap();
/// let path = write_converted_description(&cache, "cache_double").unwrap();
/// ```
pub fn write_converted_description(cache: &CacheDescriptor, output_base: &str) -> Result<PathBuf> {
    let output = cache.directory.join(format!("{output_base}.xml"));
    if output == cache.path {
        return Err(Error::OutputOverwritesInput(output));
    }

    info!("Writing description {}", output.display());
    let mut reader = BufReader::new(File::open(&cache.path)?);
    let mut writer = BufWriter::new(File::create(&output)?);

    let mut line = String::new();
    let mut replaced = 0;
    while reader.read_line(&mut line)? > 0 {
        replaced += line.matches(FLOAT_VECTOR_ARRAY).count();
        writer.write_all(convert_description_text(&line).as_bytes())?;
        line.clear();
    }
    writer.flush()?;

    debug!("Replaced {replaced} {FLOAT_VECTOR_ARRAY} declarations");
    Ok(output)
}

/// Swap every single-precision vector array type for the double equivalent
///
/// ```rust
/// # use mctools_description::convert_description_text;
/// let line = r#"<channel0 ChannelType="FloatVectorArray"/>"#;
/// assert_eq!(
///     convert_description_text(line),
///     r#"<channel0 ChannelType="DoubleVectorArray"/>"#
/// );
/// ```
pub fn convert_description_text(text: &str) -> String {
    text.replace(FLOAT_VECTOR_ARRAY, DOUBLE_VECTOR_ARRAY)
}
