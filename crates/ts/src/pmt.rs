use std::collections::BTreeMap;

use bytes::{Buf, Bytes};
use tracing::info;

use crate::error::TableKind;
use crate::psi::Psi;
use crate::{Result, TsError};

/// Stream types carried in the PMT stream_type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Mpeg1Video,
    Mpeg2Video,
    Mpeg1Audio,
    Mpeg2Audio,
    PrivateSections,
    PrivatePes,
    /// ADTS AAC Audio
    AdtsAac,
    Mpeg4Visual,
    /// LATM AAC Audio
    LatmAac,
    /// Metadata carried in PES packets
    MetadataPes,
    /// AVC video stream (ITU-T Rec. H.264 | ISO/IEC 14496-10)
    H264,
    /// HEVC video stream (ITU-T Rec. H.265 | ISO/IEC 23008-2)
    H265,
    /// VVC video stream (ITU-T Rec. H.266 | ISO/IEC 23090-3)
    H266,
    /// Chinese AVS2-P2 video
    Avs2,
    /// Chinese AVS3-P1 video
    Avs3,
    /// AC-3 audio stream (ATSC A/52B)
    Ac3,
    Dts,
    TrueHd,
    /// E-AC-3 audio stream (ATSC A/52B)
    EAc3,
    /// SCTE-35 splice information
    Scte35,
    /// Anything not listed above
    Unknown(u8),
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x05 => StreamType::PrivateSections,
            0x06 => StreamType::PrivatePes,
            0x0F => StreamType::AdtsAac,
            0x10 => StreamType::Mpeg4Visual,
            0x11 => StreamType::LatmAac,
            0x15 => StreamType::MetadataPes,
            0x1B => StreamType::H264,
            0x24 => StreamType::H265,
            0x33 => StreamType::H266,
            0x40 => StreamType::Avs2,
            0x41 => StreamType::Avs3,
            0x81 => StreamType::Ac3,
            0x82 => StreamType::Dts,
            0x83 => StreamType::TrueHd,
            0x84 => StreamType::EAc3,
            0x86 => StreamType::Scte35,
            _ => StreamType::Unknown(value),
        }
    }
}

impl From<StreamType> for u8 {
    fn from(value: StreamType) -> Self {
        match value {
            StreamType::Mpeg1Video => 0x01,
            StreamType::Mpeg2Video => 0x02,
            StreamType::Mpeg1Audio => 0x03,
            StreamType::Mpeg2Audio => 0x04,
            StreamType::PrivateSections => 0x05,
            StreamType::PrivatePes => 0x06,
            StreamType::AdtsAac => 0x0F,
            StreamType::Mpeg4Visual => 0x10,
            StreamType::LatmAac => 0x11,
            StreamType::MetadataPes => 0x15,
            StreamType::H264 => 0x1B,
            StreamType::H265 => 0x24,
            StreamType::H266 => 0x33,
            StreamType::Avs2 => 0x40,
            StreamType::Avs3 => 0x41,
            StreamType::Ac3 => 0x81,
            StreamType::Dts => 0x82,
            StreamType::TrueHd => 0x83,
            StreamType::EAc3 => 0x84,
            StreamType::Scte35 => 0x86,
            StreamType::Unknown(value) => value,
        }
    }
}

impl StreamType {
    /// Check if this stream type is video
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            StreamType::Mpeg1Video
                | StreamType::Mpeg2Video
                | StreamType::Mpeg4Visual
                | StreamType::H264
                | StreamType::H265
                | StreamType::H266
                | StreamType::Avs2
                | StreamType::Avs3
        )
    }

    /// Check if this stream type is audio
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            StreamType::Mpeg1Audio
                | StreamType::Mpeg2Audio
                | StreamType::AdtsAac
                | StreamType::LatmAac
                | StreamType::Ac3
                | StreamType::EAc3
                | StreamType::Dts
                | StreamType::TrueHd
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            StreamType::Mpeg1Video => "MPEG-1 video",
            StreamType::Mpeg2Video => "MPEG-2 video",
            StreamType::Mpeg1Audio => "MPEG-1 audio",
            StreamType::Mpeg2Audio => "MPEG-2 audio",
            StreamType::PrivateSections => "private sections",
            StreamType::PrivatePes => "private PES",
            StreamType::AdtsAac => "AAC (ADTS)",
            StreamType::Mpeg4Visual => "MPEG-4 visual",
            StreamType::LatmAac => "AAC (LATM)",
            StreamType::MetadataPes => "metadata",
            StreamType::H264 => "H.264",
            StreamType::H265 => "H.265",
            StreamType::H266 => "H.266",
            StreamType::Avs2 => "AVS2",
            StreamType::Avs3 => "AVS3",
            StreamType::Ac3 => "AC-3",
            StreamType::Dts => "DTS",
            StreamType::TrueHd => "TrueHD",
            StreamType::EAc3 => "E-AC-3",
            StreamType::Scte35 => "SCTE-35",
            StreamType::Unknown(_) => "unknown",
        }
    }
}

/// Elementary stream in PMT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream_type: StreamType,
    /// Elementary PID (13 bits)
    pub elementary_pid: u16,
    /// ES info descriptors
    pub es_info: Bytes,
}

/// Program Map Table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pmt {
    /// Program number, from the section's table ID extension
    pub program_number: u16,
    pub pcr_pid: u16,
    /// Program info descriptors
    pub program_info: Bytes,
    pub streams: Vec<StreamInfo>,
}

impl Pmt {
    /// Decode the PMT carried by `psi`.
    ///
    /// The first section supplies the PCR PID and program descriptors. Later
    /// sections in the same payload with the same table ID and extension
    /// contribute their stream entries in order. Returns `Ok(None)` when the
    /// payload held no section at all.
    pub fn parse(psi: &Psi) -> Result<Option<Self>> {
        let Some((first, rest)) = psi.tables.split_first() else {
            return Ok(None);
        };

        let mut pmt = Self::parse_section(&first.section.data)?;
        pmt.program_number = first.section.table_id_extension;

        for table in rest.iter().filter(|t| {
            t.table_id == first.table_id
                && t.section.table_id_extension == first.section.table_id_extension
        }) {
            let more = Self::parse_section(&table.section.data)?;
            pmt.streams.extend(more.streams);
        }

        Ok(Some(pmt))
    }

    /// Decode one section's data bytes
    pub fn parse_section(data: &Bytes) -> Result<Self> {
        let mut reader = data.clone();

        let pcr_pid = take_u16(&mut reader, "PCR PID")? & 0x1FFF;
        let program_info_length = take_u16(&mut reader, "program info length")? & 0x03FF;
        let program_info = take(
            &mut reader,
            program_info_length as usize,
            "program info descriptors",
        )?;

        let mut streams = Vec::new();
        while reader.has_remaining() {
            let stream_type = StreamType::from(take_u8(&mut reader, "stream type")?);
            let elementary_pid = take_u16(&mut reader, "elementary PID")? & 0x1FFF;
            let es_info_length = take_u16(&mut reader, "ES info length")? & 0x03FF;
            let es_info = take(&mut reader, es_info_length as usize, "ES info descriptors")?;

            streams.push(StreamInfo {
                stream_type,
                elementary_pid,
                es_info,
            });
        }

        Ok(Pmt {
            program_number: 0,
            pcr_pid,
            program_info,
            streams,
        })
    }

    /// Get stream by PID
    pub fn stream(&self, pid: u16) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.elementary_pid == pid)
    }
}

fn take(reader: &mut Bytes, len: usize, field: &str) -> Result<Bytes> {
    if reader.remaining() < len {
        return Err(TsError::malformed(
            TableKind::Pmt,
            format!(
                "{field} needs {len} bytes but only {} remain",
                reader.remaining()
            ),
        ));
    }
    Ok(reader.split_to(len))
}

fn take_u8(reader: &mut Bytes, field: &str) -> Result<u8> {
    Ok(take(reader, 1, field)?.get_u8())
}

fn take_u16(reader: &mut Bytes, field: &str) -> Result<u16> {
    Ok(take(reader, 2, field)?.get_u16())
}

/// PMTs keyed by the PID that carried them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PmtTable {
    pmts: BTreeMap<u16, Pmt>,
}

impl PmtTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `psi` as a PMT and store it under `pid`.
    ///
    /// On a malformed body the error is returned and the entry already held
    /// for `pid` is left untouched. Returns `Ok(false)` when `psi` held no
    /// section.
    pub fn update(&mut self, psi: &Psi, pid: u16) -> Result<bool> {
        let Some(pmt) = Pmt::parse(psi)? else {
            return Ok(false);
        };

        match self.pmts.get(&pid) {
            None => info!(
                pid,
                program = pmt.program_number,
                pcr_pid = pmt.pcr_pid,
                streams = pmt.streams.len(),
                "PMT discovered"
            ),
            Some(previous) if *previous != pmt => info!(
                pid,
                program = pmt.program_number,
                streams = pmt.streams.len(),
                "PMT replaced"
            ),
            Some(_) => {}
        }
        self.pmts.insert(pid, pmt);
        Ok(true)
    }

    pub fn get(&self, pid: u16) -> Option<&Pmt> {
        self.pmts.get(&pid)
    }

    /// PMTs in ascending PID order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Pmt)> + '_ {
        self.pmts.iter().map(|(&pid, pmt)| (pid, pmt))
    }

    pub fn len(&self) -> usize {
        self.pmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pmts.is_empty()
    }
}
