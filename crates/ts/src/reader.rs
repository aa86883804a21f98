use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::{Buf, BytesMut};
use memchr::memchr;
use tracing::debug;

use crate::packet::{PACKET_SIZE, Packet, SYNC_BYTE};
use crate::{Result, TsError};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// How the synchronizer accepts a candidate sync byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Accept the first 0x47 found as the start of a packet.
    #[default]
    Lenient,
    /// Also require a sync byte (or end of stream) 188 bytes later.
    Strict,
}

/// Packet synchronizer over a sequential, forward-only byte source.
///
/// Every call resumes from wherever the source cursor currently is: bytes
/// before the next sync byte are skipped, then a full packet is returned.
#[derive(Debug)]
pub struct PacketReader<R> {
    inner: R,
    buf: BytesMut,
    sync_mode: SyncMode,
    packets_read: u64,
    bytes_skipped: u64,
}

impl PacketReader<File> {
    /// Open a file as a packet source
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

/// Open the file at `path` as a packet source
pub fn open_packet_source(path: impl AsRef<Path>) -> Result<PacketReader<File>> {
    PacketReader::open(path)
}

impl<R: Read> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        PacketReader {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            sync_mode: SyncMode::default(),
            packets_read: 0,
            bytes_skipped: 0,
        }
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Number of packets returned so far
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Number of bytes discarded while searching for sync
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next aligned packet.
    ///
    /// Returns `Ok(None)` when the source is exhausted before a sync byte is
    /// found and [`TsError::TruncatedPacket`] when it ends mid-packet. The
    /// partial bytes of a truncated packet are consumed.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        let mut skipped = 0usize;
        let result = loop {
            if self.buf.is_empty() && !self.fill(1)? {
                break Ok(None);
            }

            let Some(offset) = memchr(SYNC_BYTE, &self.buf) else {
                skipped += self.buf.len();
                self.buf.clear();
                continue;
            };
            self.buf.advance(offset);
            skipped += offset;

            if !self.fill(PACKET_SIZE)? {
                let actual = self.buf.len();
                self.buf.clear();
                break Err(TsError::TruncatedPacket {
                    expected: PACKET_SIZE,
                    actual,
                });
            }

            if self.sync_mode == SyncMode::Strict
                && self.fill(PACKET_SIZE + 1)?
                && self.buf[PACKET_SIZE] != SYNC_BYTE
            {
                debug!(
                    next = self.buf[PACKET_SIZE],
                    "Rejecting sync candidate: no sync byte at the following packet boundary"
                );
                self.buf.advance(1);
                skipped += 1;
                continue;
            }

            self.packets_read += 1;
            let data = self.buf.split_to(PACKET_SIZE).freeze();
            break Ok(Some(Packet::from_aligned(data)));
        };

        if skipped > 0 {
            self.bytes_skipped += skipped as u64;
            debug!(
                skipped,
                packet = self.packets_read,
                "Skipped bytes while searching for sync"
            );
        }
        result
    }

    /// Buffer at least `wanted` bytes. Returns `false` if the source ran dry first.
    fn fill(&mut self, wanted: usize) -> io::Result<bool> {
        while self.buf.len() < wanted {
            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK_SIZE, 0);
            match self.inner.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    return Ok(false);
                }
                Ok(n) => self.buf.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.buf.truncate(start),
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_packet().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn packet(pid: u16, fill: u8) -> Vec<u8> {
        let mut data = vec![fill; PACKET_SIZE];
        data[0] = SYNC_BYTE;
        data[1] = ((pid >> 8) & 0x1F) as u8;
        data[2] = (pid & 0xFF) as u8;
        data[3] = 0x10;
        data
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn test_reads_aligned_packets() {
        let mut data = packet(0x100, 0x00);
        data.extend(packet(0x101, 0x00));
        let mut reader = PacketReader::new(Cursor::new(data));

        assert_eq!(reader.read_packet().unwrap().unwrap().pid(), 0x100);
        assert_eq!(reader.read_packet().unwrap().unwrap().pid(), 0x101);
        assert!(reader.read_packet().unwrap().is_none());
        assert_eq!(reader.packets_read(), 2);
        assert_eq!(reader.bytes_skipped(), 0);
    }

    #[test]
    fn test_skips_garbage_before_sync() {
        let mut data = vec![0x00, 0x12, 0x34];
        data.extend(packet(0x42, 0x00));
        let mut reader = PacketReader::new(Cursor::new(data));

        let packet = reader.read_packet().unwrap().unwrap();
        assert_eq!(packet.pid(), 0x42);
        assert_eq!(reader.bytes_skipped(), 3);
    }

    #[test]
    fn test_no_sync_is_end_of_stream() {
        let mut reader = PacketReader::new(Cursor::new(vec![0u8; 1000]));
        assert!(reader.read_packet().unwrap().is_none());
        assert_eq!(reader.bytes_skipped(), 1000);
    }

    #[test]
    fn test_truncated_packet() {
        let mut data = packet(0x100, 0x00);
        data.truncate(100);
        let mut reader = PacketReader::new(Cursor::new(data));

        match reader.read_packet() {
            Err(TsError::TruncatedPacket { expected, actual }) => {
                assert_eq!(expected, PACKET_SIZE);
                assert_eq!(actual, 100);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        // The reader stays usable; the partial bytes were consumed.
        assert!(reader.read_packet().unwrap().is_none());
    }

    #[test]
    fn test_io_failure_surfaces() {
        let mut reader = PacketReader::new(FailingReader);
        assert!(matches!(reader.read_packet(), Err(TsError::Io(_))));
    }

    #[test]
    fn test_strict_mode_rejects_false_sync() {
        // A stray 0x47 five bytes before the real packet boundary.
        let mut data = vec![SYNC_BYTE, 0x01, 0x02, 0x03, 0x04];
        data.extend(packet(0x100, 0x00));
        data.extend(packet(0x101, 0x00));

        let mut lenient = PacketReader::new(Cursor::new(data.clone()));
        let first = lenient.read_packet().unwrap().unwrap();
        assert_eq!(&first.as_bytes()[..5], &data[..5]);

        let mut strict = PacketReader::new(Cursor::new(data)).with_sync_mode(SyncMode::Strict);
        assert_eq!(strict.read_packet().unwrap().unwrap().pid(), 0x100);
        assert_eq!(strict.read_packet().unwrap().unwrap().pid(), 0x101);
        assert!(strict.read_packet().unwrap().is_none());
        assert_eq!(strict.bytes_skipped(), 5);
    }

    #[test]
    fn test_iterator() {
        let mut data = Vec::new();
        for pid in 0..5u16 {
            data.extend(packet(pid, 0xFF));
        }
        let pids: Vec<u16> = PacketReader::new(Cursor::new(data))
            .map(|packet| packet.unwrap().pid())
            .collect();
        assert_eq!(pids, vec![0, 1, 2, 3, 4]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_first_packet_is_prefix(
            mut data in prop::collection::vec(any::<u8>(), PACKET_SIZE..PACKET_SIZE * 3)
        ) {
            data[0] = SYNC_BYTE;
            let mut reader = PacketReader::new(Cursor::new(data.clone()));
            let packet = reader.read_packet().unwrap().unwrap();
            prop_assert_eq!(packet.as_bytes(), &data[..PACKET_SIZE]);
        }
    }
}
