use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::header::Header;
use crate::packet::{PID_PAT, Packet};
use crate::pat::Pat;
use crate::pmt::PmtTable;
use crate::psi::{Psi, decode_psi};
use crate::reader::{PacketReader, SyncMode};
use crate::{Result, TsError};

/// Role of a packet, decided from its PID and the PAT as it stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketRole {
    Pat,
    Pmt,
    Elementary,
}

/// Classify `pid` against the current PAT.
///
/// Recomputed for every packet: the PAT can gain mappings at any time.
pub fn classify(pid: u16, pat: &Pat) -> PacketRole {
    if pid == PID_PAT {
        PacketRole::Pat
    } else if pat.is_pmt_pid(pid) {
        PacketRole::Pmt
    } else {
        PacketRole::Elementary
    }
}

/// Demux configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxConfig {
    pub sync_mode: SyncMode,
    /// Drop PSI sections whose CRC32 does not match before applying them
    pub verify_crc: bool,
    /// Stop after this many packets
    pub packet_limit: Option<u64>,
}

impl DemuxConfig {
    pub fn builder() -> DemuxConfigBuilder {
        DemuxConfigBuilder::default()
    }

    /// Wrap `source` in a packet reader using the configured sync mode
    pub fn reader<R: Read>(&self, source: R) -> PacketReader<R> {
        PacketReader::new(source).with_sync_mode(self.sync_mode)
    }
}

impl fmt::Display for DemuxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Demux configuration: sync={:?}, verify_crc={}, packet_limit=",
            self.sync_mode, self.verify_crc
        )?;
        match self.packet_limit {
            Some(limit) => write!(f, "{limit}"),
            None => f.write_str("unlimited"),
        }
    }
}

#[derive(Debug, Default)]
pub struct DemuxConfigBuilder {
    config: DemuxConfig,
}

impl DemuxConfigBuilder {
    pub fn sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.config.sync_mode = sync_mode;
        self
    }

    pub fn verify_crc(mut self, verify_crc: bool) -> Self {
        self.config.verify_crc = verify_crc;
        self
    }

    pub fn packet_limit(mut self, limit: Option<u64>) -> Self {
        self.config.packet_limit = limit;
        self
    }

    pub fn build(self) -> DemuxConfig {
        self.config
    }
}

/// Counters collected while demuxing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub packets: u64,
    pub pat_packets: u64,
    pub pmt_packets: u64,
    pub malformed_tables: u64,
    pub crc_failures: u64,
    /// Packets with the transport error indicator set
    pub transport_errors: u64,
    /// Elementary packets per PID
    pub pid_counts: BTreeMap<u16, u64>,
}

/// Why [`Demux::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    EndOfStream,
    LimitReached,
    Cancelled,
}

/// Demux driver owning the PAT/PMT state of one stream
#[derive(Debug, Default)]
pub struct Demux {
    config: DemuxConfig,
    pat: Pat,
    pmts: PmtTable,
    stats: DemuxStats,
}

impl Demux {
    pub fn new(config: DemuxConfig) -> Self {
        Demux {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    pub fn pat(&self) -> &Pat {
        &self.pat
    }

    pub fn pmts(&self) -> &PmtTable {
        &self.pmts
    }

    pub fn stats(&self) -> &DemuxStats {
        &self.stats
    }

    /// Classify one packet and apply any PSI it carries.
    ///
    /// A malformed PMT is reported as [`TsError::Packet`] with the packet
    /// index and PID; the state held for that PID is left unchanged.
    pub fn process_packet(&mut self, packet: &Packet) -> Result<PacketRole> {
        let header = packet.header();
        let index = self.stats.packets;
        self.stats.packets += 1;

        if header.transport_error_indicator {
            self.stats.transport_errors += 1;
            debug!(index, pid = header.pid, "Transport error indicator set");
        }

        let role = classify(header.pid, &self.pat);
        match role {
            PacketRole::Pat => {
                self.stats.pat_packets += 1;
                let psi = self.walk(packet, &header);
                self.pat.update(&psi);
            }
            PacketRole::Pmt => {
                self.stats.pmt_packets += 1;
                let psi = self.walk(packet, &header);
                if let Err(source) = self.pmts.update(&psi, header.pid) {
                    self.stats.malformed_tables += 1;
                    return Err(TsError::Packet {
                        index,
                        pid: header.pid,
                        source: Box::new(source),
                    });
                }
            }
            PacketRole::Elementary => {
                *self.stats.pid_counts.entry(header.pid).or_insert(0) += 1;
            }
        }
        Ok(role)
    }

    /// Read and process packets until the source ends, the packet limit is
    /// reached or `cancel` fires.
    ///
    /// Cancellation is checked between reads. Malformed tables are logged
    /// and skipped; I/O failures and truncation are returned.
    pub fn run<R: Read>(
        &mut self,
        reader: &mut PacketReader<R>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        info!("{}", self.config);

        let outcome = loop {
            if cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            if self
                .config
                .packet_limit
                .is_some_and(|limit| self.stats.packets >= limit)
            {
                break RunOutcome::LimitReached;
            }

            let Some(packet) = reader.read_packet()? else {
                break RunOutcome::EndOfStream;
            };

            match self.process_packet(&packet) {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => warn!(error = %e, "Skipping malformed table"),
                Err(e) => return Err(e),
            }
        };

        info!(
            ?outcome,
            packets = self.stats.packets,
            programs = self.pat.len(),
            pmts = self.pmts.len(),
            bytes_skipped = reader.bytes_skipped(),
            "Demux finished"
        );
        Ok(outcome)
    }

    fn walk(&mut self, packet: &Packet, header: &Header) -> Psi {
        let Some(payload) = packet.payload() else {
            return Psi::default();
        };
        let mut psi = decode_psi(payload, header.payload_unit_start_indicator);

        if self.config.verify_crc {
            let dropped = psi.retain_valid_crc();
            if dropped > 0 {
                self.stats.crc_failures += dropped as u64;
                warn!(pid = header.pid, dropped, "Dropped PSI sections with bad CRC32");
            }
        }
        psi
    }
}
