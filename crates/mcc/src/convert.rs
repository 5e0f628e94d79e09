//! Complete conversion of a cache, description and data files

// crate modules
use crate::error::{Error, Result};
use crate::transcode::{
    plan_frames, transcode_frames, transcode_one_file, ConvertOptions, TranscodeReport,
};

// external crates
use log::info;
use mctools_description::{write_converted_description, CacheDescriptor, CacheType};

/// Newest cache version the converter understands
pub const MAX_SUPPORTED_VERSION: f64 = 2.0;

/// Convert a cache to double-precision vector arrays
///
/// Writes `<output_base>.xml` and the converted data files alongside the
/// original cache. The cache, including the name of every frame file, is
/// checked before anything is written.
///
/// ```rust, no_run
/// # use mctools_description::CacheDescriptor;
/// # use mctools_mcc::{convert_cache, ConvertOptions};
/// let cache = CacheDescriptor::from_file("/path/to/cache.xml").unwrap();
/// let report = convert_cache(&cache, "cache_double", &ConvertOptions::default()).unwrap();
/// println!("{} channels converted", report.converted_channels());
/// ```
pub fn convert_cache(
    cache: &CacheDescriptor,
    output_base: &str,
    options: &ConvertOptions,
) -> Result<TranscodeReport> {
    if cache.version > MAX_SUPPORTED_VERSION {
        return Err(Error::UnsupportedVersion(cache.version));
    }

    if let CacheType::Unknown(name) = &cache.cache_type {
        return Err(Error::UnknownCacheType(name.clone()));
    }

    if output_base == cache.base_name {
        return Err(Error::OutputOverwritesInput(
            cache.directory.join(output_base),
        ));
    }

    let frames = match cache.cache_type {
        CacheType::OneFile if !cache.data_file().is_file() => {
            return Err(Error::MissingFile(cache.data_file()))
        }
        CacheType::OneFilePerFrame => Some(plan_frames(cache, output_base)?),
        _ => None,
    };

    info!("Writing new description file");
    write_converted_description(cache, output_base)?;

    info!("Converting {} data files", cache.cache_type);
    match frames {
        Some(frames) => transcode_frames(&frames, options),
        None => transcode_one_file(cache, output_base, options),
    }
}
