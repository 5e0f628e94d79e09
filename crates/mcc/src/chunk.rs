//! Primitive reads and writes of the tagged chunk grammar
//!
//! Every data file is a sequence of 4-byte tags, 32-bit signed integers and
//! byte strings padded out to the next 4-byte boundary. Integers and array
//! values are byte swapped when `swap_bytes` is set, see
//! [host_swap_policy()].

// standard library
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

// crate modules
use crate::error::{Error, Result};

/// Four byte chunk identifier, compared as raw bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Group chunk, wraps the header and every sample block
    pub const FOR4: Tag = Tag(*b"FOR4");
    /// Sample block marker following a `FOR4` length
    pub const MYCH: Tag = Tag(*b"MYCH");
    /// Sample time record, single file caches only
    pub const TIME: Tag = Tag(*b"TIME");
    /// Channel name record
    pub const CHNM: Tag = Tag(*b"CHNM");
    /// Channel element count record
    pub const SIZE: Tag = Tag(*b"SIZE");
    /// Float vector array payload
    pub const FVCA: Tag = Tag(*b"FVCA");
    /// Double vector array payload
    pub const DVCA: Tag = Tag(*b"DVCA");

    /// Raw bytes of the tag
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            // all ascii, so this is always valid utf8
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            for b in self.0 {
                write!(f, "{}", std::ascii::escape_default(b))?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// Default byte swap policy for the host
///
/// Swapping is decided from the name of the host operating system, not from
/// its byte order: `true` on Windows and Linux, `false` everywhere else.
/// Converted files only match those written by the Maya devkit tools if the
/// same rule is applied.
pub fn host_swap_policy() -> bool {
    matches!(std::env::consts::OS, "windows" | "linux")
}

/// Length of a byte string once padded to a 4-byte boundary
///
/// ```rust
/// # use mctools_mcc::padded_length;
/// assert_eq!(padded_length(0), 0);
/// assert_eq!(padded_length(5), 8);
/// assert_eq!(padded_length(8), 8);
/// ```
pub const fn padded_length(length: usize) -> usize {
    (length + 3) & !3
}

/// Reader for chunk primitives that keeps track of the byte offset
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    offset: u64,
    swap_bytes: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Wrap a byte stream positioned at offset zero
    pub fn new(inner: R, swap_bytes: bool) -> Self {
        Self {
            inner,
            offset: 0,
            swap_bytes,
        }
    }

    /// Number of bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether integers and array values are byte swapped
    pub fn swap_bytes(&self) -> bool {
        self.swap_bytes
    }

    /// Read the next tag
    pub fn read_tag(&mut self) -> Result<Tag> {
        let mut buffer = [0u8; 4];
        self.fill(&mut buffer)?;
        Ok(Tag(buffer))
    }

    /// Read the next tag, or `None` on a clean end of stream
    ///
    /// Running out of data part way through the tag is still an error.
    pub fn read_tag_or_eof(&mut self) -> Result<Option<Tag>> {
        let start = self.offset;
        let mut buffer = [0u8; 4];
        let mut filled = 0;

        while filled < buffer.len() {
            match self.inner.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.offset += filled as u64;

        match filled {
            0 => Ok(None),
            4 => Ok(Some(Tag(buffer))),
            n => Err(Error::malformed(
                "4 byte tag",
                format!("{n} bytes before end of stream"),
                start,
            )),
        }
    }

    /// Read the next tag and check it against `expected`
    pub fn expect_tag(&mut self, expected: Tag) -> Result<Tag> {
        let start = self.offset;
        let found = self.read_tag()?;
        if found != expected {
            return Err(Error::malformed(expected.to_string(), found.to_string(), start));
        }
        Ok(found)
    }

    /// Read a 32-bit signed integer
    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buffer = [0u8; 4];
        self.fill(&mut buffer)?;
        Ok(decode_i32(buffer, self.swap_bytes))
    }

    /// Read a 32-bit length or count that must not be negative
    pub fn read_length(&mut self, what: &str) -> Result<usize> {
        let start = self.offset;
        let value = self.read_i32()?;
        usize::try_from(value)
            .map_err(|_| Error::malformed(format!("non-negative {what}"), value.to_string(), start))
    }

    /// Read exactly `length` bytes
    ///
    /// Grows the buffer as data arrives, so a corrupt length cannot trigger a
    /// huge allocation up front.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        let start = self.offset;
        let mut buffer = Vec::new();
        (&mut self.inner)
            .take(length as u64)
            .read_to_end(&mut buffer)?;
        self.offset += buffer.len() as u64;

        if buffer.len() < length {
            return Err(Error::malformed(
                format!("{length} bytes"),
                format!("{} bytes before end of stream", buffer.len()),
                start,
            ));
        }
        Ok(buffer)
    }

    /// Read a byte string of `declared_length` and its alignment padding
    ///
    /// Returns the payload and the padding separately. The padding is not
    /// guaranteed to be zeroed and must be written back as it was found.
    pub fn read_padded_bytes(&mut self, declared_length: usize) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut payload = self.read_bytes(padded_length(declared_length))?;
        let padding = payload.split_off(declared_length);
        Ok((payload, padding))
    }

    /// Consume whatever is left in the stream, returning the byte count
    pub fn drain(&mut self) -> Result<u64> {
        let remaining = io::copy(&mut self.inner, &mut io::sink())?;
        self.offset += remaining;
        Ok(remaining)
    }

    fn fill(&mut self, buffer: &mut [u8]) -> Result<()> {
        let start = self.offset;
        let length = buffer.len();
        self.inner.read_exact(buffer).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                Error::malformed(format!("{length} bytes"), "end of stream", start)
            }
            _ => Error::IOError(e),
        })?;
        self.offset += length as u64;
        Ok(())
    }
}

/// Writer for chunk primitives
#[derive(Debug)]
pub struct ChunkWriter<W: Write> {
    inner: W,
    swap_bytes: bool,
}

impl<W: Write> ChunkWriter<W> {
    /// Wrap a byte sink
    pub fn new(inner: W, swap_bytes: bool) -> Self {
        Self { inner, swap_bytes }
    }

    /// Whether integers and array values are byte swapped
    pub fn swap_bytes(&self) -> bool {
        self.swap_bytes
    }

    /// Write a tag
    pub fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.write_bytes(tag.as_bytes())
    }

    /// Write a 32-bit signed integer
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&encode_i32(value, self.swap_bytes))
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Flush and hand back the underlying sink
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn decode_i32(bytes: [u8; 4], swap_bytes: bool) -> i32 {
    let value = i32::from_ne_bytes(bytes);
    match swap_bytes {
        true => value.swap_bytes(),
        false => value,
    }
}

fn encode_i32(value: i32, swap_bytes: bool) -> [u8; 4] {
    match swap_bytes {
        true => value.swap_bytes().to_ne_bytes(),
        false => value.to_ne_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: &[u8], swap: bool) -> ChunkReader<Cursor<Vec<u8>>> {
        ChunkReader::new(Cursor::new(bytes.to_vec()), swap)
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::FOR4.to_string(), "FOR4");
        assert_eq!(Tag(*b"AB\0\n").to_string(), "AB\\x00\\n");
    }

    #[test]
    fn test_padded_length() {
        let lengths: Vec<usize> = (0..10).map(padded_length).collect();
        assert_eq!(lengths, vec![0, 4, 4, 4, 4, 8, 8, 8, 8, 12]);
    }

    #[test]
    fn test_i32_byte_order() {
        let mut bytes = 1i32.to_ne_bytes();
        assert_eq!(reader(&bytes, false).read_i32().unwrap(), 1);
        bytes.reverse();
        assert_eq!(reader(&bytes, true).read_i32().unwrap(), 1);

        let mut writer = ChunkWriter::new(Vec::new(), true);
        writer.write_i32(-2).unwrap();
        let mut expected = (-2i32).to_ne_bytes();
        expected.reverse();
        assert_eq!(writer.finish().unwrap(), expected.to_vec());
    }

    #[test]
    fn test_padded_bytes_keep_padding() {
        let mut r = reader(b"abcde\x01\x02\x03SIZE", false);
        let (name, padding) = r.read_padded_bytes(5).unwrap();
        assert_eq!(name, b"abcde");
        assert_eq!(padding, vec![1, 2, 3]);
        assert_eq!(r.offset(), 8);
        assert_eq!(r.read_tag().unwrap(), Tag::SIZE);
    }

    #[test]
    fn test_expect_tag_reports_offset() {
        let mut r = reader(b"FOR4MYCX", false);
        r.expect_tag(Tag::FOR4).unwrap();
        match r.expect_tag(Tag::MYCH) {
            Err(Error::MalformedCache {
                expected,
                found,
                offset,
            }) => {
                assert_eq!(expected, "MYCH");
                assert_eq!(found, "MYCX");
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_end_of_stream() {
        assert_eq!(reader(b"", false).read_tag_or_eof().unwrap(), None);
        assert!(reader(b"FO", false).read_tag_or_eof().unwrap_err().is_malformed());
        assert!(reader(b"\x00\x00", false).read_i32().unwrap_err().is_malformed());
        assert!(reader(b"abc", false).read_padded_bytes(3).is_err());
    }

    #[test]
    fn test_negative_length() {
        let bytes = (-4i32).to_ne_bytes();
        assert!(reader(&bytes, false)
            .read_length("name length")
            .unwrap_err()
            .is_malformed());
    }
}
