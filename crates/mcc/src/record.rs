//! Decoded forms of the header, sample blocks and channel records
//!
//! A sample block is buffered in full before it is written back out, since
//! its length field comes first and depends on every record inside it.

// standard library
use std::io::{Cursor, Read, Write};

// crate modules
use crate::array::VectorArray;
use crate::chunk::{padded_length, ChunkReader, ChunkWriter, Tag};
use crate::error::{Error, Result};

// external crates
use log::{debug, trace, warn};

/// Size in bytes of a tag, an integer, or a tag/length pair's halves
const WORD: usize = 4;

/// Whether sample blocks carry an embedded `TIME` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
    /// Single file caches, every block starts with its sample time
    WithTime,
    /// Per-frame caches, the time comes from the file name
    WithoutTime,
}

/// Leading `FOR4` group of a data file, kept as opaque bytes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheHeader {
    /// Everything following the header's length field
    pub bytes: Vec<u8>,
}

impl CacheHeader {
    /// Read the leading group of a data file
    pub fn decode<R: Read>(reader: &mut ChunkReader<R>) -> Result<Self> {
        reader.expect_tag(Tag::FOR4)?;
        let length = reader.read_length("header length")?;
        let bytes = reader.read_bytes(length)?;
        trace!("Header of {length} bytes");
        Ok(Self { bytes })
    }

    /// Write the header back out unchanged
    pub fn encode<W: Write>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        writer.write_tag(Tag::FOR4)?;
        writer.write_i32(block_length(self.bytes.len())?)?;
        writer.write_bytes(&self.bytes)
    }

    /// Best effort listing of the header's records
    ///
    /// The header is normally a `CACH` group holding `VRSN`, `STIM` and `ETIM`
    /// records. Anything that does not follow that layout gives an empty list,
    /// since the header is never needed for conversion.
    pub fn records(&self, swap_bytes: bool) -> Vec<(Tag, Vec<u8>)> {
        let mut reader = ChunkReader::new(Cursor::new(self.bytes.as_slice()), swap_bytes);
        let mut records = Vec::new();

        if !matches!(reader.read_tag(), Ok(tag) if tag == Tag(*b"CACH")) {
            return records;
        }

        while let Ok(Some(tag)) = reader.read_tag_or_eof() {
            let data = reader
                .read_length("record length")
                .and_then(|length| reader.read_padded_bytes(length));
            match data {
                Ok((data, _)) => records.push((tag, data)),
                Err(_) => break,
            }
        }
        records
    }
}

/// Time record at the start of a single file sample block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTime {
    /// Size of the time variable, always 4 in practice
    pub var_size: i32,
    /// Sample time in ticks
    pub ticks: i32,
}

/// One channel's data at one sample time
///
/// ```text
/// CHNM <name length> <name> <padding>
/// SIZE <4> <element count>
/// FVCA|DVCA <buffer length> <payload>
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    /// Raw channel name bytes, usually including a trailing nul
    pub name: Vec<u8>,
    /// Alignment bytes after the name, echoed verbatim
    pub padding: Vec<u8>,
    /// Size of the element count variable, always 4 in practice
    pub array_var_size: i32,
    /// Number of `(x,y,z)` vectors
    pub element_count: i32,
    /// Vector values
    pub data: VectorArray,
}

impl ChannelRecord {
    /// Decode the next channel record
    pub fn decode<R: Read>(reader: &mut ChunkReader<R>) -> Result<Self> {
        reader.expect_tag(Tag::CHNM)?;
        let name_length = reader.read_length("channel name length")?;
        let (name, padding) = reader.read_padded_bytes(name_length)?;

        reader.expect_tag(Tag::SIZE)?;
        let array_var_size = reader.read_i32()?;
        let element_count = reader.read_length("element count")?;

        let format_offset = reader.offset();
        let format = reader.read_tag()?;
        let width = VectorArray::element_width(format).ok_or_else(|| {
            Error::malformed(
                format!("{} or {}", Tag::FVCA, Tag::DVCA),
                format.to_string(),
                format_offset,
            )
        })?;

        let length_offset = reader.offset();
        let buffer_length = reader.read_i32()?;
        let expected = element_count as u64 * 3 * width as u64;
        if i64::from(buffer_length) != expected as i64 {
            return Err(Error::malformed(
                format!("{format} buffer of {expected} bytes ({element_count} vectors)"),
                format!("{buffer_length} bytes"),
                length_offset,
            ));
        }

        let payload = reader.read_bytes(expected as usize)?;
        let data = VectorArray::from_bytes(format, &payload, reader.swap_bytes()).ok_or_else(
            || Error::malformed("vector array payload", format.to_string(), format_offset),
        )?;

        let record = Self {
            name,
            padding,
            array_var_size,
            // read from a non-negative i32, cannot truncate
            element_count: element_count as i32,
            data,
        };
        debug!(
            "Channel {:?}: {} x{}",
            record.name(),
            format,
            record.element_count
        );
        Ok(record)
    }

    /// Write the record, recomputing the buffer length from the data
    pub fn encode<W: Write>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        writer.write_tag(Tag::CHNM)?;
        writer.write_i32(block_length(self.name.len())?)?;
        writer.write_bytes(&self.name)?;
        writer.write_bytes(&self.padding)?;
        writer.write_tag(Tag::SIZE)?;
        writer.write_i32(self.array_var_size)?;
        writer.write_i32(self.element_count)?;
        writer.write_tag(self.data.tag())?;
        writer.write_i32(block_length(self.data.byte_len())?)?;
        writer.write_bytes(&self.data.to_bytes(writer.swap_bytes()))
    }

    /// Number of bytes [ChannelRecord::encode] will write
    pub fn encoded_len(&self) -> usize {
        // CHNM + length, SIZE + var size + count, format + buffer length
        7 * WORD + padded_length(self.name.len()) + self.data.byte_len()
    }

    /// Channel name as text, without trailing nul bytes
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_end_matches('\0')
            .to_string()
    }

    /// True if the payload is single precision
    pub fn is_float(&self) -> bool {
        matches!(self.data, VectorArray::Float(_))
    }

    /// Convert a float payload to doubles, everything else is unchanged
    pub fn into_double(self) -> Self {
        Self {
            data: self.data.into_double(),
            ..self
        }
    }
}

/// All channel records for one sample time
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    /// Embedded time record, `None` for per-frame files
    pub time: Option<SampleTime>,
    /// Channel records in file order
    pub channels: Vec<ChannelRecord>,
}

impl SampleBlock {
    /// Read the next `FOR4` sample block, `None` at a clean end of stream
    ///
    /// Returns the block with the length declared in the file.
    pub fn read_next<R: Read>(
        reader: &mut ChunkReader<R>,
        layout: BlockLayout,
    ) -> Result<Option<(Self, usize)>> {
        let start = reader.offset();
        let tag = match reader.read_tag_or_eof()? {
            Some(tag) => tag,
            None => return Ok(None),
        };
        if tag != Tag::FOR4 {
            return Err(Error::malformed(Tag::FOR4.to_string(), tag.to_string(), start));
        }

        let declared_length = reader.read_length("block length")?;
        let block = Self::decode_body(reader, declared_length, layout)?;
        Ok(Some((block, declared_length)))
    }

    /// Decode everything following a sample block's length field
    ///
    /// Channel records are read until `declared_length` bytes have been
    /// consumed. A record running past the declared length is an error.
    pub fn decode_body<R: Read>(
        reader: &mut ChunkReader<R>,
        declared_length: usize,
        layout: BlockLayout,
    ) -> Result<Self> {
        let start = reader.offset();

        reader.expect_tag(Tag::MYCH)?;
        let time = match layout {
            BlockLayout::WithTime => {
                reader.expect_tag(Tag::TIME)?;
                Some(SampleTime {
                    var_size: reader.read_i32()?,
                    ticks: reader.read_i32()?,
                })
            }
            BlockLayout::WithoutTime => None,
        };

        let mut channels = Vec::new();
        while ((reader.offset() - start) as usize) < declared_length {
            channels.push(ChannelRecord::decode(reader)?);
        }

        let consumed = (reader.offset() - start) as usize;
        if consumed != declared_length {
            return Err(Error::malformed(
                format!("block of {declared_length} bytes"),
                format!("{consumed} bytes"),
                start,
            ));
        }

        Ok(Self { time, channels })
    }

    /// Write the block with a length field matching its current contents
    pub fn encode<W: Write>(&self, writer: &mut ChunkWriter<W>) -> Result<()> {
        writer.write_tag(Tag::FOR4)?;
        writer.write_i32(block_length(self.encoded_len())?)?;
        writer.write_tag(Tag::MYCH)?;
        if let Some(time) = self.time {
            writer.write_tag(Tag::TIME)?;
            writer.write_i32(time.var_size)?;
            writer.write_i32(time.ticks)?;
        }
        for channel in &self.channels {
            channel.encode(writer)?;
        }
        Ok(())
    }

    /// Number of bytes following the block's length field
    pub fn encoded_len(&self) -> usize {
        let time = match self.time {
            Some(_) => 3 * WORD,
            None => 0,
        };
        WORD + time + self.channels.iter().map(ChannelRecord::encoded_len).sum::<usize>()
    }

    /// Convert every float channel to doubles
    pub fn into_double(self) -> Self {
        Self {
            time: self.time,
            channels: self
                .channels
                .into_iter()
                .map(ChannelRecord::into_double)
                .collect(),
        }
    }

    /// Number of channels with single-precision payloads
    pub fn float_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.is_float()).count()
    }
}

/// Visit every sample block of a data stream positioned after its header
///
/// Single file streams hold any number of blocks up to the end of the
/// stream. Per-frame streams hold exactly one, anything after it is ignored.
pub fn for_each_block<R, F>(
    reader: &mut ChunkReader<R>,
    layout: BlockLayout,
    mut visit: F,
) -> Result<()>
where
    R: Read,
    F: FnMut(SampleBlock, usize) -> Result<()>,
{
    match layout {
        BlockLayout::WithTime => {
            while let Some((block, declared_length)) = SampleBlock::read_next(reader, layout)? {
                visit(block, declared_length)?;
            }
        }
        BlockLayout::WithoutTime => {
            let start = reader.offset();
            let (block, declared_length) = SampleBlock::read_next(reader, layout)?
                .ok_or_else(|| Error::malformed(Tag::FOR4.to_string(), "end of stream", start))?;
            visit(block, declared_length)?;

            let trailing = reader.drain()?;
            if trailing > 0 {
                warn!("Ignoring {trailing} bytes after the sample block");
            }
        }
    }
    Ok(())
}

/// Fit a byte count into a 32-bit length field
fn block_length(length: usize) -> Result<i32> {
    i32::try_from(length).map_err(|_| Error::BlockTooLarge(length))
}
