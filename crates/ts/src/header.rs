use std::fmt;

use crate::packet::SYNC_BYTE;

/// Transport Scrambling Control (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScramblingControl {
    /// `00`
    NotScrambled,
    /// `01`
    ScrambledReserved,
    /// `10`
    EvenKey,
    /// `11`
    OddKey,
}

impl ScramblingControl {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => ScramblingControl::NotScrambled,
            0b01 => ScramblingControl::ScrambledReserved,
            0b10 => ScramblingControl::EvenKey,
            _ => ScramblingControl::OddKey,
        }
    }

    fn bits(self) -> u8 {
        match self {
            ScramblingControl::NotScrambled => 0b00,
            ScramblingControl::ScrambledReserved => 0b01,
            ScramblingControl::EvenKey => 0b10,
            ScramblingControl::OddKey => 0b11,
        }
    }

    pub fn is_scrambled(self) -> bool {
        self != ScramblingControl::NotScrambled
    }
}

/// Adaptation Field Control (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdaptationFieldControl {
    /// `00`
    Reserved,
    /// `01`
    PayloadOnly,
    /// `10`
    AdaptationOnly,
    /// `11`
    AdaptationAndPayload,
}

impl AdaptationFieldControl {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => AdaptationFieldControl::Reserved,
            0b01 => AdaptationFieldControl::PayloadOnly,
            0b10 => AdaptationFieldControl::AdaptationOnly,
            _ => AdaptationFieldControl::AdaptationAndPayload,
        }
    }

    fn bits(self) -> u8 {
        match self {
            AdaptationFieldControl::Reserved => 0b00,
            AdaptationFieldControl::PayloadOnly => 0b01,
            AdaptationFieldControl::AdaptationOnly => 0b10,
            AdaptationFieldControl::AdaptationAndPayload => 0b11,
        }
    }

    /// Check if packets with this control carry a payload
    pub fn has_payload(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::PayloadOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }

    /// Check if packets with this control carry an adaptation field
    pub fn has_adaptation_field(self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::AdaptationOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }
}

/// Decoded 4-byte transport packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Transport Error Indicator
    pub transport_error_indicator: bool,
    /// Payload Unit Start Indicator
    pub payload_unit_start_indicator: bool,
    /// Transport Priority
    pub transport_priority: bool,
    /// Packet Identifier (13 bits)
    pub pid: u16,
    /// Transport Scrambling Control
    pub scrambling_control: ScramblingControl,
    /// Adaptation Field Control
    pub adaptation_field_control: AdaptationFieldControl,
    /// Continuity Counter (4 bits)
    pub continuity_counter: u8,
}

impl Header {
    /// Decode the header bitfields from the first four bytes of a packet.
    ///
    /// The sync byte is not checked here; bit extraction over a fixed-width
    /// input cannot fail.
    pub fn decode(bytes: &[u8; 4]) -> Self {
        let word = u32::from_be_bytes(*bytes);
        Header {
            transport_error_indicator: word & 0x0080_0000 != 0,
            payload_unit_start_indicator: word & 0x0040_0000 != 0,
            transport_priority: word & 0x0020_0000 != 0,
            pid: ((word >> 8) & 0x1FFF) as u16,
            scrambling_control: ScramblingControl::from_bits((word >> 6) as u8),
            adaptation_field_control: AdaptationFieldControl::from_bits((word >> 4) as u8),
            continuity_counter: (word & 0x0F) as u8,
        }
    }

    /// Encode the header back into its wire form, sync byte included.
    pub fn encode(&self) -> [u8; 4] {
        let mut word = (SYNC_BYTE as u32) << 24;
        if self.transport_error_indicator {
            word |= 0x0080_0000;
        }
        if self.payload_unit_start_indicator {
            word |= 0x0040_0000;
        }
        if self.transport_priority {
            word |= 0x0020_0000;
        }
        word |= ((self.pid & 0x1FFF) as u32) << 8;
        word |= (self.scrambling_control.bits() as u32) << 6;
        word |= (self.adaptation_field_control.bits() as u32) << 4;
        word |= (self.continuity_counter & 0x0F) as u32;
        word.to_be_bytes()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID 0x{:04x} TEI={} PUSI={} priority={} TSC={:?} AFC={:?} CC={}",
            self.pid,
            self.transport_error_indicator as u8,
            self.payload_unit_start_indicator as u8,
            self.transport_priority as u8,
            self.scrambling_control,
            self.adaptation_field_control,
            self.continuity_counter,
        )
    }
}
