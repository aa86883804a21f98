use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "MPEG-TS packet and PSI inspection tool",
    long_about = "Reads an MPEG transport stream file, synchronizes its 188-byte packets\n\
                  and either prints their decoded headers or demultiplexes the PAT/PMT\n\
                  tables and prints which PIDs carry which program's streams."
)]
pub struct CliArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the decoded header of the first packets
    Headers {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of packets to print
        #[arg(
            short = 'n',
            long,
            default_value = "30",
            help = "Number of packet headers to print"
        )]
        packets: u64,
    },

    /// Demultiplex PAT/PMT and count packets per PID
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of packets to read
        #[arg(
            short = 'n',
            long,
            help = "Number of packets to read (default: the whole stream)"
        )]
        packets: Option<u64>,

        /// Drop PSI sections with a bad CRC32
        #[arg(
            long,
            help = "Verify the CRC32 of every PSI section and ignore sections that fail"
        )]
        verify_crc: bool,
    },
}

#[derive(Args)]
pub struct SourceArgs {
    /// Transport stream file
    #[arg(required = true, help = "Path to the transport stream file")]
    pub input: PathBuf,

    /// Require a sync byte at the next packet boundary before accepting a packet
    #[arg(
        long,
        help = "Only accept a sync byte when another one follows 188 bytes later"
    )]
    pub strict_sync: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_defaults() {
        let args = CliArgs::try_parse_from(["tsdump", "headers", "in.ts"]).unwrap();
        assert!(!args.verbose);
        match args.command {
            Command::Headers { source, packets } => {
                assert_eq!(source.input, PathBuf::from("in.ts"));
                assert!(!source.strict_sync);
                assert_eq!(packets, 30);
            }
            Command::Summary { .. } => panic!("expected headers"),
        }
    }

    #[test]
    fn test_summary_flags() {
        let args = CliArgs::try_parse_from([
            "tsdump",
            "summary",
            "-v",
            "--strict-sync",
            "--verify-crc",
            "-n",
            "1000",
            "in.ts",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Summary {
                source,
                packets,
                verify_crc,
            } => {
                assert!(source.strict_sync);
                assert!(verify_crc);
                assert_eq!(packets, Some(1000));
            }
            Command::Headers { .. } => panic!("expected summary"),
        }
    }

    #[test]
    fn test_input_required() {
        assert!(CliArgs::try_parse_from(["tsdump", "summary"]).is_err());
    }
}
