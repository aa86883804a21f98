//! MPEG Transport Stream (TS) demultiplexer for PAT and PMT tables
//!
//! This crate synchronizes 188-byte packets out of an arbitrary byte source,
//! decodes their headers, walks the PSI sections carried in their payloads
//! and accumulates the Program Association Table (PAT) and Program Map
//! Tables (PMT) that describe which PIDs carry which program's streams.

pub mod crc32;
pub mod demux;
pub mod error;
pub mod header;
pub mod packet;
pub mod pat;
pub mod pmt;
pub mod psi;
pub mod reader;

#[cfg(test)]
mod test_util;

pub use demux::{Demux, DemuxConfig, DemuxStats, PacketRole, RunOutcome, classify};
pub use error::{TableKind, TsError};
pub use header::{AdaptationFieldControl, Header, ScramblingControl};
pub use packet::{PACKET_SIZE, PID_NULL, PID_PAT, Packet, SYNC_BYTE, decode_header};
pub use pat::{Pat, PatProgram, PatProgramIterator};
pub use pmt::{Pmt, PmtTable, StreamInfo, StreamType};
pub use psi::{Psi, SyntaxSection, TableHeader, decode_psi};
pub use reader::{PacketReader, SyncMode, open_packet_source};

/// Result type for TS parsing operations
pub type Result<T> = std::result::Result<T, TsError>;
