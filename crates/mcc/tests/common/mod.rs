//! Data file fixtures written directly with the chunk primitives
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use mctools_mcc::{padded_length, ChunkWriter, Tag, VectorArray};

/// Padding byte used for channel names, deliberately not zero
pub const PADDING: u8 = 0xEE;

/// One channel of a fixture sample
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: Vec<u8>,
    pub data: VectorArray,
}

impl Channel {
    pub fn float(name: &str, values: &[f32]) -> Self {
        Self {
            name: nul_terminated(name),
            data: VectorArray::Float(values.to_vec()),
        }
    }

    pub fn double(name: &str, values: &[f64]) -> Self {
        Self {
            name: nul_terminated(name),
            data: VectorArray::Double(values.to_vec()),
        }
    }

    /// Bytes taken by the record inside a sample block
    pub fn length(&self) -> usize {
        28 + padded_length(self.name.len()) + self.data.byte_len()
    }
}

fn nul_terminated(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Length field of a sample block holding `channels`
pub fn block_length(time: Option<i32>, channels: &[Channel]) -> usize {
    let time = if time.is_some() { 12 } else { 0 };
    4 + time + channels.iter().map(Channel::length).sum::<usize>()
}

/// Complete data file, one sample block per entry in `samples`
pub fn data_file(samples: &[(Option<i32>, Vec<Channel>)], swap: bool) -> Vec<u8> {
    let mut w = ChunkWriter::new(Vec::new(), swap);
    write_header(&mut w);

    for (time, channels) in samples {
        w.write_tag(Tag::FOR4).unwrap();
        w.write_i32(block_length(*time, channels) as i32).unwrap();
        w.write_tag(Tag::MYCH).unwrap();
        if let Some(ticks) = time {
            w.write_tag(Tag::TIME).unwrap();
            w.write_i32(4).unwrap();
            w.write_i32(*ticks).unwrap();
        }
        for channel in channels {
            write_channel(&mut w, channel);
        }
    }
    w.finish().unwrap()
}

/// Size of the header group written by [data_file()], including `FOR4`
pub const HEADER_SIZE: usize = 8 + 40;

fn write_header(w: &mut ChunkWriter<Vec<u8>>) {
    w.write_tag(Tag::FOR4).unwrap();
    w.write_i32(40).unwrap();
    w.write_tag(Tag(*b"CACH")).unwrap();
    w.write_tag(Tag(*b"VRSN")).unwrap();
    w.write_i32(4).unwrap();
    w.write_bytes(b"0.1\0").unwrap();
    w.write_tag(Tag(*b"STIM")).unwrap();
    w.write_i32(4).unwrap();
    w.write_i32(250).unwrap();
    w.write_tag(Tag(*b"ETIM")).unwrap();
    w.write_i32(4).unwrap();
    w.write_i32(500).unwrap();
}

fn write_channel(w: &mut ChunkWriter<Vec<u8>>, channel: &Channel) {
    let padding = padded_length(channel.name.len()) - channel.name.len();
    w.write_tag(Tag::CHNM).unwrap();
    w.write_i32(channel.name.len() as i32).unwrap();
    w.write_bytes(&channel.name).unwrap();
    w.write_bytes(&vec![PADDING; padding]).unwrap();
    w.write_tag(Tag::SIZE).unwrap();
    w.write_i32(4).unwrap();
    w.write_i32((channel.data.len() / 3) as i32).unwrap();
    w.write_tag(channel.data.tag()).unwrap();
    w.write_i32(channel.data.byte_len() as i32).unwrap();
    let bytes = channel.data.to_bytes(w.swap_bytes());
    w.write_bytes(&bytes).unwrap();
}

/// Description document for a cache with `channels` float channels
pub fn description(cache_type: &str, version: &str, channels: &[&str]) -> String {
    let mut document = String::from("<?xml version=\"1.0\"?>\n<Autodesk_Cache_File>\n");
    document += &format!("  <cacheType Type=\"{cache_type}\" Format=\"mcc\"/>\n");
    document += "  <time Range=\"250-750\"/>\n";
    document += "  <cacheTimePerFrame TimePerFrame=\"250\"/>\n";
    document += &format!("  <cacheVersion Version=\"{version}\"/>\n");
    document += "  <Channels>\n";
    for (i, name) in channels.iter().enumerate() {
        document += &format!(
            "    <channel{i} ChannelName=\"{name}\" ChannelType=\"FloatVectorArray\" \
             ChannelInterpretation=\"positions\" SamplingType=\"Regular\" \
             SamplingRate=\"250\" StartTime=\"250\" EndTime=\"750\"/>\n"
        );
    }
    document += "  </Channels>\n</Autodesk_Cache_File>\n";
    document
}

/// Sorted file names in a directory
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
