use std::fmt;

use thiserror::Error;

/// PSI table kinds whose bodies are decoded by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Pat,
    Pmt,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Pat => f.write_str("PAT"),
            TableKind::Pmt => f.write_str("PMT"),
        }
    }
}

/// Errors that can occur while reading and demultiplexing a transport stream
#[derive(Error, Debug)]
pub enum TsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated packet: expected {expected} bytes after sync, got {actual}")]
    TruncatedPacket { expected: usize, actual: usize },

    #[error("Invalid packet size: expected 188 bytes, got {0}")]
    InvalidPacketSize(usize),

    #[error("Invalid sync byte: expected 0x47, got 0x{0:02x}")]
    InvalidSyncByte(u8),

    #[error("Malformed {table} table: {reason}")]
    MalformedTable { table: TableKind, reason: String },

    #[error("Packet #{index} (PID 0x{pid:04x}): {source}")]
    Packet {
        index: u64,
        pid: u16,
        #[source]
        source: Box<TsError>,
    },
}

impl TsError {
    pub(crate) fn malformed(table: TableKind, reason: impl Into<String>) -> Self {
        TsError::MalformedTable {
            table,
            reason: reason.into(),
        }
    }

    /// Whether the scan can continue past this error.
    ///
    /// Malformed tables only invalidate the packet that carried them; I/O
    /// failures and truncation end the scan.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TsError::MalformedTable { .. } => true,
            TsError::Packet { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}
