//! Wire format for the alternating-bit protocol.
//!
//! Every datagram is a fixed 12-byte header followed by an opaque payload.
//! All multi-byte integers are big-endian.
//!
//! ```text
//! offset  size  field
//! 0       8     magic constant "COMPNETW" (framing sentinel, unchecked)
//! 8       2     checksum (ones' complement, see [`crate::checksum`])
//! 10      2     packed: bits [15:2] total length, bit 1 ack flag, bit 0 seq
//! 12      N     payload (empty for ack packets)
//! ```
//!
//! `total length` includes the header, so `N = total_length - 12`.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::checksum;

/// Framing sentinel at the start of every datagram. Written on encode,
/// implied by the length field on decode, content never validated.
pub const MAGIC: [u8; 8] = *b"COMPNETW";

/// Fixed header size: magic + checksum + packed field.
pub const HEADER_LEN: usize = 12;

/// The packed field stores the total length in 14 bits.
pub const MAX_PAYLOAD: usize = 0x3FFF - HEADER_LEN;

const OFF_CHECKSUM: usize = 8;
const OFF_PACKED: usize = 10;

/// Errors raised while parsing a raw datagram.
///
/// Callers treat every variant the same way: the datagram is corrupted and
/// must not advance protocol state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram shorter than the {HEADER_LEN}-byte header")]
    Truncated,
    #[error("checksum verification failed")]
    Checksum,
    #[error("length field {field} does not match datagram size {actual}")]
    LengthMismatch { field: usize, actual: usize },
}

/// Alternating-bit sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqBit {
    Zero,
    One,
}

impl SeqBit {
    /// The other bit.
    pub fn flip(self) -> Self {
        match self {
            SeqBit::Zero => SeqBit::One,
            SeqBit::One => SeqBit::Zero,
        }
    }

    pub fn bit(self) -> u16 {
        match self {
            SeqBit::Zero => 0,
            SeqBit::One => 1,
        }
    }

    pub fn from_bit(bit: u16) -> Self {
        if bit & 1 == 0 { SeqBit::Zero } else { SeqBit::One }
    }
}

impl std::fmt::Display for SeqBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bit())
    }
}

/// The length/ack/seq fields packed into one 16-bit word:
/// `(total_len << 2) | (ack << 1) | seq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedHeader {
    pub total_len: usize,
    pub ack: bool,
    pub seq: SeqBit,
}

impl PackedHeader {
    /// Unpack the header word from a raw datagram.
    ///
    /// Only requires the buffer to reach past the packed field; no
    /// checksum or length validation happens here.
    pub fn parse(datagram: &[u8]) -> Result<Self, WireError> {
        if datagram.len() < HEADER_LEN {
            return Err(WireError::Truncated);
        }
        let word = u16::from_be_bytes([datagram[OFF_PACKED], datagram[OFF_PACKED + 1]]);
        Ok(Self {
            total_len: (word >> 2) as usize,
            ack: word & 0b10 != 0,
            seq: SeqBit::from_bit(word),
        })
    }

    fn pack(total_len: usize, ack: bool, seq: SeqBit) -> u16 {
        ((total_len as u16) << 2) | ((ack as u16) << 1) | seq.bit()
    }
}

/// Immutable protocol packet: either a data packet carrying a payload or a
/// payload-free acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// True for acknowledgment packets.
    pub ack: bool,
    /// Sequence number of the data, or of the round being acknowledged.
    pub seq: SeqBit,
    pub payload: Bytes,
}

impl Packet {
    /// A data packet for one application message.
    pub fn data(seq: SeqBit, payload: impl Into<Bytes>) -> Self {
        Self {
            ack: false,
            seq,
            payload: payload.into(),
        }
    }

    /// An acknowledgment for `seq`.
    pub fn ack(seq: SeqBit) -> Self {
        Self {
            ack: true,
            seq,
            payload: Bytes::new(),
        }
    }

    /// Serialize into wire bytes.
    ///
    /// Deterministic: identical packets encode to identical bytes, which
    /// retransmission relies on. The checksum is computed over the datagram
    /// with the checksum field zeroed, then written in place.
    pub fn encode(&self) -> Bytes {
        debug_assert!(self.payload.len() <= MAX_PAYLOAD);
        let total_len = HEADER_LEN + self.payload.len();

        let mut buf = BytesMut::with_capacity(total_len);
        buf.put_slice(&MAGIC);
        buf.put_u16(0); // checksum placeholder
        buf.put_u16(PackedHeader::pack(total_len, self.ack, self.seq));
        buf.put_slice(&self.payload);

        let csum = checksum::internet_checksum(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&csum.to_be_bytes());
        buf.freeze()
    }

    /// Parse and validate a raw datagram.
    ///
    /// The checksum is the sole corruption signal; the length field must
    /// also agree with the actual datagram size.
    pub fn decode(datagram: &[u8]) -> Result<Self, WireError> {
        let header = PackedHeader::parse(datagram)?;
        if !checksum::verify(datagram) {
            return Err(WireError::Checksum);
        }
        if header.total_len != datagram.len() {
            return Err(WireError::LengthMismatch {
                field: header.total_len,
                actual: datagram.len(),
            });
        }
        Ok(Self {
            ack: header.ack,
            seq: header.seq,
            payload: Bytes::copy_from_slice(&datagram[HEADER_LEN..]),
        })
    }
}
