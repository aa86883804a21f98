//! Stream builders shared by the unit tests.

use crate::crc32::mpeg2_crc32;
use crate::packet::{PACKET_SIZE, SYNC_BYTE};

/// Build a complete long-form section: table header, syntax section, data and a valid CRC.
pub fn section(table_id: u8, table_id_extension: u16, data: &[u8]) -> Vec<u8> {
    let section_length = (data.len() + 9) as u16;
    let mut out = vec![
        table_id,
        0xB0 | ((section_length >> 8) as u8 & 0x03),
        (section_length & 0xFF) as u8,
    ];
    out.extend_from_slice(&table_id_extension.to_be_bytes());
    out.push(0xC1); // version 0, current
    out.push(0x00); // section number
    out.push(0x00); // last section number
    out.extend_from_slice(data);
    let crc = mpeg2_crc32(&out);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

/// Build a payload-only packet with PUSI set, pointer field 0 and 0xFF stuffing.
pub fn psi_packet(pid: u16, continuity_counter: u8, sections: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![
        SYNC_BYTE,
        0x40 | ((pid >> 8) as u8 & 0x1F),
        (pid & 0xFF) as u8,
        0x10 | (continuity_counter & 0x0F),
        0x00,
    ];
    for section in sections {
        out.extend_from_slice(section);
    }
    out.resize(PACKET_SIZE, 0xFF);
    out
}

/// Build a payload-only elementary packet without PUSI.
pub fn es_packet(pid: u16, continuity_counter: u8) -> Vec<u8> {
    let mut out = vec![
        SYNC_BYTE,
        (pid >> 8) as u8 & 0x1F,
        (pid & 0xFF) as u8,
        0x10 | (continuity_counter & 0x0F),
    ];
    out.resize(PACKET_SIZE, 0x00);
    out
}
