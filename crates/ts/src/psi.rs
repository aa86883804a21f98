use bytes::{Buf, Bytes};
use tracing::trace;

use crate::crc32::mpeg2_crc32;

/// Table ID marking stuffing: no more tables in this payload
pub const TABLE_ID_STUFFING: u8 = 0xFF;

/// Largest section length a PSI section may declare
pub const MAX_SECTION_LENGTH: u16 = 1021;

const TABLE_HEADER_SIZE: usize = 3;
const SYNTAX_HEADER_SIZE: usize = 5;
const CRC_SIZE: usize = 4;
/// Smallest section that still holds the syntax header and CRC
const MIN_SECTION_LENGTH: u16 = (SYNTAX_HEADER_SIZE + CRC_SIZE) as u16;

/// Long-form syntax section that follows the 3-byte table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxSection {
    /// Table ID extension (transport stream ID for PAT, program number for PMT)
    pub table_id_extension: u16,
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
    /// Table specific data, `section_length - 9` bytes
    pub data: Bytes,
    /// CRC32 as carried on the wire. Not checked while walking.
    pub crc32: u32,
}

/// One PSI section found in a packet payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    /// Section length (10 bits)
    pub section_length: u16,
    pub section: SyntaxSection,
    /// The whole section, table header and CRC included
    raw: Bytes,
}

impl TableHeader {
    /// Total bytes this section occupies in the payload
    pub fn size(&self) -> usize {
        self.section_length as usize + TABLE_HEADER_SIZE
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Check the stored CRC32 against the section contents
    pub fn crc_is_valid(&self) -> bool {
        let covered = &self.raw[..self.raw.len() - CRC_SIZE];
        mpeg2_crc32(covered) == self.section.crc32
    }

    /// Decode the section starting at `payload[0]`.
    ///
    /// Returns `None` without consuming anything when fewer than three bytes
    /// remain, the table ID is the stuffing sentinel, or the section length is
    /// out of range for the remaining bytes.
    fn parse(payload: &Bytes) -> Option<Self> {
        if payload.len() < TABLE_HEADER_SIZE || payload[0] == TABLE_ID_STUFFING {
            return None;
        }

        let table_id = payload[0];
        let section_syntax_indicator = payload[1] & 0x80 != 0;
        let section_length = ((payload[1] as u16 & 0x03) << 8) | payload[2] as u16;
        if !(MIN_SECTION_LENGTH..=MAX_SECTION_LENGTH).contains(&section_length) {
            return None;
        }
        let size = TABLE_HEADER_SIZE + section_length as usize;
        if payload.len() < size {
            return None;
        }

        let raw = payload.slice(..size);
        let mut reader = &raw[TABLE_HEADER_SIZE..];
        let table_id_extension = reader.get_u16();
        let flags = reader.get_u8();
        let section_number = reader.get_u8();
        let last_section_number = reader.get_u8();

        let data_start = TABLE_HEADER_SIZE + SYNTAX_HEADER_SIZE;
        let data_end = size - CRC_SIZE;
        let data = raw.slice(data_start..data_end);
        let crc32 = (&raw[data_end..]).get_u32();

        Some(TableHeader {
            table_id,
            section_syntax_indicator,
            section_length,
            section: SyntaxSection {
                table_id_extension,
                version_number: (flags >> 1) & 0x1F,
                current_next_indicator: flags & 0x01 != 0,
                section_number,
                last_section_number,
                data,
                crc32,
            },
            raw,
        })
    }
}

/// Sections found in one packet payload plus the bytes left after them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Psi {
    pub tables: Vec<TableHeader>,
    /// Stuffing or unparseable bytes after the last section, uninterpreted
    pub residual: Bytes,
}

impl Psi {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Keep only the sections whose CRC32 checks out; returns how many were dropped
    pub fn retain_valid_crc(&mut self) -> usize {
        let before = self.tables.len();
        self.tables.retain(TableHeader::crc_is_valid);
        before - self.tables.len()
    }
}

/// Walk the back-to-back sections of a packet payload.
///
/// With `pusi` set the first byte is the pointer field and the walk starts
/// after the bytes it skips. Without it the payload is walked from offset 0;
/// sections continued from an earlier packet are not reassembled.
pub fn decode_psi(mut payload: Bytes, pusi: bool) -> Psi {
    if pusi {
        let skip = payload.first().map_or(0, |&pointer| 1 + pointer as usize);
        payload.advance(skip.min(payload.len()));
    }

    let mut tables = Vec::new();
    while let Some(table) = TableHeader::parse(&payload) {
        trace!(
            table_id = table.table_id,
            section_length = table.section_length,
            extension = table.section.table_id_extension,
            "Decoded PSI section"
        );
        payload.advance(table.size());
        tables.push(table);
    }

    Psi {
        tables,
        residual: payload,
    }
}
