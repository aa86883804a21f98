use std::io::{self, Write};

use ts_demux::{Demux, Header};

pub fn write_header_line<W: Write>(out: &mut W, index: u64, header: &Header) -> io::Result<()> {
    writeln!(out, "#{index:<6} {header}")
}

/// Print the PAT, the PMTs and the per-PID packet counts gathered by `demux`
pub fn write_summary<W: Write>(out: &mut W, demux: &Demux) -> io::Result<()> {
    writeln!(out, "== PAT:")?;
    for program in demux.pat().programs() {
        writeln!(
            out,
            "program #{}: PMT PID 0x{:04x}",
            program.program_number, program.pmt_pid
        )?;
    }

    writeln!(out, "\n== PMTs:")?;
    for (pid, pmt) in demux.pmts().iter() {
        writeln!(
            out,
            "PID 0x{pid:04x} (program #{}): PCR PID = 0x{:04x}, descriptors = [{}]",
            pmt.program_number,
            pmt.pcr_pid,
            pmt.program_info.len()
        )?;
        for stream in &pmt.streams {
            writeln!(
                out,
                "--> PID 0x{:04x}: type = 0x{:02x} ({}), descriptors = [{}]",
                stream.elementary_pid,
                u8::from(stream.stream_type),
                stream.stream_type.name(),
                stream.es_info.len()
            )?;
        }
    }

    let stats = demux.stats();
    writeln!(out, "\n== PID counts:")?;
    for (pid, count) in &stats.pid_counts {
        writeln!(out, "total {count} packets of PID 0x{pid:04x}")?;
    }

    writeln!(
        out,
        "\n{} packets: {} PAT, {} PMT, {} malformed tables, {} CRC failures, {} transport errors",
        stats.packets,
        stats.pat_packets,
        stats.pmt_packets,
        stats.malformed_tables,
        stats.crc_failures,
        stats.transport_errors
    )
}
