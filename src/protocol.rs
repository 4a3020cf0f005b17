//! Datagram layout for decoded audio between `radiobuf send` and
//! `radiobuf receive`.
//!
//! Every datagram is a fixed [`PacketHeader`] followed by exactly one
//! segment of PCM. All header fields are little endian.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::buffer::Segment;

pub const MAGIC: u32 = 0x00a1_d10b;

/// Largest datagram we will ever try to receive.
pub const MAX_PACKET_SIZE: usize = 65507;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct PacketHeader {
    pub magic: u32,
    pub flags: u32,
    pub seq: u64,
}

const_assert_eq!(16, std::mem::size_of::<PacketHeader>());

pub const HEADER_SIZE: usize = std::mem::size_of::<PacketHeader>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Short(usize),
    Magic(u32),
    /// Payload is not exactly one segment long.
    Length { expected: usize, actual: usize },
}

#[derive(Debug)]
pub struct AudioPacket {
    pub seq: u64,
    pub samples: Segment,
}

pub fn parse(datagram: &[u8], segment_len: usize) -> Result<AudioPacket, ParseError> {
    if datagram.len() < HEADER_SIZE {
        return Err(ParseError::Short(datagram.len()));
    }

    let (header, payload) = datagram.split_at(HEADER_SIZE);
    let header: PacketHeader = bytemuck::pod_read_unaligned(header);

    let magic = u32::from_le(header.magic);
    if magic != MAGIC {
        return Err(ParseError::Magic(magic));
    }

    if payload.len() != segment_len {
        return Err(ParseError::Length { expected: segment_len, actual: payload.len() });
    }

    Ok(AudioPacket {
        seq: u64::from_le(header.seq),
        samples: Segment::from_slice(payload),
    })
}

pub fn encode(seq: u64, samples: &[u8]) -> Vec<u8> {
    let header = PacketHeader {
        magic: MAGIC.to_le(),
        flags: 0,
        seq: seq.to_le(),
    };

    let mut datagram = Vec::with_capacity(HEADER_SIZE + samples.len());
    datagram.extend_from_slice(bytemuck::bytes_of(&header));
    datagram.extend_from_slice(samples);
    datagram
}
