//! MPEG-2 CRC-32 (ITU-T H.222.0 / ISO 13818-1) used by PSI sections.
//!
//! Polynomial 0x04C11DB7, init 0xFFFFFFFF, no reflection, no final XOR.
//! This is not the zlib CRC-32.

use crc::{CRC_32_MPEG_2, Crc};

const MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Compute MPEG-2 CRC-32 over a byte slice.
pub fn mpeg2_crc32(data: &[u8]) -> u32 {
    MPEG2.checksum(data)
}
