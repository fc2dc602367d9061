use clap::{Parser, ValueEnum};
use simplelog::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "A simulated glucose sensor",
    long_about = "This is a simulated glucose sensor. Every COMMAND is written to the Record \
    Access Control Point of the sensor, and the glucose measurements reported and the responses \
    to the commands are printed. Commands are hex strings, e.g. `0101` reports all records and \
    `0401` reports the number of records."
)]
pub struct Cli {
    /// Number of simulated records
    #[arg(short, long, default_value_t = 11)]
    pub records: usize,

    /// Load the records from a YAML file instead of simulating them
    #[arg(long, value_name = "PATH", conflicts_with = "records")]
    pub records_file: Option<PathBuf>,

    /// Indexes of the records to mark as deleted
    #[arg(short, long, value_delimiter = ',')]
    pub deleted: Vec<usize>,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// What to do with commands written while another command is in progress
    #[arg(long, value_enum, default_value_t = BusyPolicy::Drop)]
    pub busy_policy: BusyPolicy,

    /// Number of notifications and indications that can be queued for the client
    #[arg(long, default_value_t = 4)]
    pub capacity: usize,

    /// Time (in milliseconds) to wait for the response to a command
    #[arg(long, default_value_t = 500)]
    pub timeout: u64,

    /// Commands written to the record access control point
    #[arg(required = true, value_parser = parse_hex)]
    pub commands: Vec<HexCommand>,
}

/// A command given as a hex string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexCommand(pub Vec<u8>);

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BusyPolicy {
    Drop,
    ProcedureNotCompleted,
}

impl From<BusyPolicy> for racp::BusyPolicy {
    fn from(policy: BusyPolicy) -> Self {
        match policy {
            BusyPolicy::Drop => racp::BusyPolicy::Drop,
            BusyPolicy::ProcedureNotCompleted => racp::BusyPolicy::ProcedureNotCompleted,
        }
    }
}

fn parse_hex(arg: &str) -> Result<HexCommand, String> {
    let digits: Vec<char> = arg.trim_start_matches("0x").chars().filter(|c| *c != '_').collect();

    if digits.len() % 2 != 0 {
        return Err(format!("'{arg}' has an odd number of hex digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();

            u8::from_str_radix(&byte, 16).map_err(|_| format!("'{byte}' is not a hex byte"))
        })
        .collect::<Result<_, _>>()
        .map(HexCommand)
}
