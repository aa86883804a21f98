use bytes::Bytes;

use crate::header::Header;
use crate::{Result, TsError};

/// Size of every transport packet in bytes
pub const PACKET_SIZE: usize = 188;

/// Sync byte at offset 0 of every aligned packet ('G')
pub const SYNC_BYTE: u8 = 0x47;

/// PAT PID (always 0x0000)
pub const PID_PAT: u16 = 0x0000;

/// NULL PID (always 0x1FFF)
pub const PID_NULL: u16 = 0x1FFF;

const HEADER_SIZE: usize = 4;

/// A single aligned 188-byte transport packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Source packet data (exactly 188 bytes, starting with the sync byte)
    data: Bytes,
}

impl Packet {
    /// Parse a TS packet from 188 bytes
    pub fn parse(data: Bytes) -> Result<Self> {
        if data.len() != PACKET_SIZE {
            return Err(TsError::InvalidPacketSize(data.len()));
        }
        if data[0] != SYNC_BYTE {
            return Err(TsError::InvalidSyncByte(data[0]));
        }
        Ok(Packet { data })
    }

    /// Wrap bytes the synchronizer has already aligned.
    pub(crate) fn from_aligned(data: Bytes) -> Self {
        debug_assert_eq!(data.len(), PACKET_SIZE);
        debug_assert_eq!(data[0], SYNC_BYTE);
        Packet { data }
    }

    /// Raw packet bytes, sync byte included
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Decode the 4-byte header
    pub fn header(&self) -> Header {
        let mut word = [0u8; HEADER_SIZE];
        word.copy_from_slice(&self.data[..HEADER_SIZE]);
        Header::decode(&word)
    }

    pub fn pid(&self) -> u16 {
        ((self.data[1] as u16 & 0x1F) << 8) | self.data[2] as u16
    }

    /// Get adaptation field data (without its length byte)
    pub fn adaptation_field(&self) -> Option<Bytes> {
        if !self.header().adaptation_field_control.has_adaptation_field() {
            return None;
        }
        let length = self.data[HEADER_SIZE] as usize;
        let start = HEADER_SIZE + 1;
        if start + length <= PACKET_SIZE {
            Some(self.data.slice(start..start + length))
        } else {
            None
        }
    }

    /// Get payload data following the header and any adaptation field.
    ///
    /// Returns `None` when the adaptation field control announces no payload
    /// or when the adaptation field length runs past the end of the packet.
    pub fn payload(&self) -> Option<Bytes> {
        let control = self.header().adaptation_field_control;
        if !control.has_payload() {
            return None;
        }
        let mut offset = HEADER_SIZE;
        if control.has_adaptation_field() {
            offset += 1 + self.data[HEADER_SIZE] as usize;
        }
        if offset < PACKET_SIZE {
            Some(self.data.slice(offset..))
        } else {
            None
        }
    }

    /// Check if this packet has a random access indicator
    pub fn has_random_access_indicator(&self) -> bool {
        self.adaptation_field()
            .is_some_and(|field| !field.is_empty() && field[0] & 0x40 != 0)
    }
}

/// Decode the header of an aligned packet
pub fn decode_header(packet: &Packet) -> Header {
    packet.header()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::AdaptationFieldControl;

    fn packet_with(byte3: u8) -> Vec<u8> {
        let mut data = vec![0xFFu8; PACKET_SIZE];
        data[0] = SYNC_BYTE;
        data[1] = 0x41; // PUSI, PID high = 1
        data[2] = 0x00;
        data[3] = byte3;
        data
    }

    #[test]
    fn test_invalid_sync_byte() {
        let mut data = vec![0u8; PACKET_SIZE];
        data[0] = 0x46;
        assert!(matches!(
            Packet::parse(Bytes::from(data)),
            Err(TsError::InvalidSyncByte(0x46))
        ));
    }

    #[test]
    fn test_invalid_packet_size() {
        let data = vec![SYNC_BYTE; 100];
        assert!(matches!(
            Packet::parse(Bytes::from(data)),
            Err(TsError::InvalidPacketSize(100))
        ));
    }

    #[test]
    fn test_payload_only() {
        let packet = Packet::parse(Bytes::from(packet_with(0x15))).unwrap();
        let header = decode_header(&packet);
        assert_eq!(header.pid, 0x100);
        assert_eq!(packet.pid(), 0x100);
        assert_eq!(header.continuity_counter, 5);
        assert_eq!(packet.payload().unwrap().len(), PACKET_SIZE - 4);
        assert!(packet.adaptation_field().is_none());
    }

    #[test]
    fn test_payload_after_adaptation_field() {
        let mut data = packet_with(0x30);
        data[4] = 7; // adaptation field length
        data[5] = 0x40; // random access indicator
        data[12] = 0xAB; // first payload byte
        let packet = Packet::parse(Bytes::from(data)).unwrap();

        assert_eq!(
            packet.header().adaptation_field_control,
            AdaptationFieldControl::AdaptationAndPayload
        );
        assert_eq!(packet.adaptation_field().unwrap().len(), 7);
        assert!(packet.has_random_access_indicator());
        let payload = packet.payload().unwrap();
        assert_eq!(payload.len(), PACKET_SIZE - 12);
        assert_eq!(payload[0], 0xAB);
    }

    #[test]
    fn test_adaptation_only_has_no_payload() {
        let mut data = packet_with(0x20);
        data[4] = 183;
        let packet = Packet::parse(Bytes::from(data)).unwrap();
        assert!(packet.payload().is_none());
        assert_eq!(packet.adaptation_field().unwrap().len(), 183);
    }

    #[test]
    fn test_overlong_adaptation_field() {
        let mut data = packet_with(0x30);
        data[4] = 200;
        let packet = Packet::parse(Bytes::from(data)).unwrap();
        assert!(packet.adaptation_field().is_none());
        assert!(packet.payload().is_none());
    }
}
