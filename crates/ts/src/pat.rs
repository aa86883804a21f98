use std::collections::BTreeMap;

use bytes::{Buf, Bytes};
use tracing::info;

use crate::psi::Psi;

/// Program entry in PAT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatProgram {
    /// Program number (0 = Network PID, others = Program numbers)
    pub program_number: u16,
    /// PID of PMT (if program_number > 0) or Network PID (if program_number = 0)
    pub pmt_pid: u16,
}

/// Iterator over the 4-byte program entries of a PAT section's data.
///
/// A trailing partial entry is ignored.
#[derive(Debug)]
pub struct PatProgramIterator {
    data: Bytes,
}

impl PatProgramIterator {
    pub fn new(data: Bytes) -> Self {
        PatProgramIterator { data }
    }
}

impl Iterator for PatProgramIterator {
    type Item = PatProgram;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.remaining() >= 4 {
            let program_number = self.data.get_u16();
            let pmt_pid = self.data.get_u16() & 0x1FFF;
            Some(PatProgram {
                program_number,
                pmt_pid,
            })
        } else {
            None
        }
    }
}

/// Program Association Table accumulated across PAT-bearing packets.
///
/// Entries are inserted or overwritten, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pat {
    /// program_number -> pmt_pid
    programs: BTreeMap<u16, u16>,
}

impl Pat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every program entry of every section in `psi`.
    ///
    /// Returns the number of entries that were new or changed their PID.
    pub fn update(&mut self, psi: &Psi) -> usize {
        let mut changed = 0;
        for table in &psi.tables {
            for program in PatProgramIterator::new(table.section.data.clone()) {
                let previous = self
                    .programs
                    .insert(program.program_number, program.pmt_pid);
                if previous != Some(program.pmt_pid) {
                    changed += 1;
                    info!(
                        program = program.program_number,
                        pid = program.pmt_pid,
                        previous_pid = ?previous,
                        "PAT program mapped"
                    );
                }
            }
        }
        changed
    }

    /// Get PMT PID for a specific program number
    pub fn pmt_pid(&self, program_number: u16) -> Option<u16> {
        self.programs.get(&program_number).copied()
    }

    /// Check if a PID carries a table listed in this PAT
    pub fn is_pmt_pid(&self, pid: u16) -> bool {
        self.programs.values().any(|&v| v == pid)
    }

    /// Program number mapped to `pid`, lowest first if several share it
    pub fn program_for_pid(&self, pid: u16) -> Option<u16> {
        self.programs
            .iter()
            .find(|&(_, &v)| v == pid)
            .map(|(&program, _)| program)
    }

    /// Get the Network PID (program number 0)
    pub fn network_pid(&self) -> Option<u16> {
        self.pmt_pid(0)
    }

    /// Programs in ascending program-number order
    pub fn programs(&self) -> impl Iterator<Item = PatProgram> + '_ {
        self.programs
            .iter()
            .map(|(&program_number, &pmt_pid)| PatProgram {
                program_number,
                pmt_pid,
            })
    }

    pub fn as_map(&self) -> &BTreeMap<u16, u16> {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl FromIterator<(u16, u16)> for Pat {
    fn from_iter<I: IntoIterator<Item = (u16, u16)>>(iter: I) -> Self {
        Pat {
            programs: iter.into_iter().collect(),
        }
    }
}
