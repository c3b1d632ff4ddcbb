//! 16-bit Internet checksum (ones' complement sum) over raw datagrams.
//!
//! The sender computes the checksum with the field zeroed; the receiver
//! folds the *entire* datagram, checksum field included, and accepts iff
//! the result is `0xFFFF`.

/// Fold `data` into a 16-bit ones' complement sum and return its complement.
///
/// Bytes are grouped into big-endian 16-bit words; a trailing odd byte is
/// padded with a zero low byte. Carries out of the 16-bit accumulator are
/// folded back in until none remain.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !(fold_sum(data))
}

/// Verify a datagram whose checksum field is already populated.
///
/// The ones' complement sum of a datagram plus its own complemented
/// checksum is all-ones, so an uncorrupted datagram folds to exactly
/// `0xFFFF`.
pub fn verify(datagram: &[u8]) -> bool {
    fold_sum(datagram) == 0xFFFF
}

fn fold_sum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);

    for chunk in &mut chunks {
        let word = u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        sum = sum.wrapping_add(word);
    }

    if let Some(&byte) = chunks.remainder().first() {
        sum = sum.wrapping_add((byte as u32) << 8);
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    sum as u16
}
