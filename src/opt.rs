//! Parse command-line arguments.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Parser};

use crate::render::Format;

#[derive(Parser, Debug)]
#[clap(
    name = "pwgenmon",
    version,
    about = "Check that a PipeWire sink is playing bit-perfect, for the XFCE Generic Monitor"
)]
pub struct Opt {
    #[clap(
        value_name = "DEVICE",
        value_parser = NonEmptyStringValueParser::new(),
        help = "Substring of the target sink's node.name (case-sensitive)"
    )]
    pub device: String,

    #[clap(
        short,
        long,
        value_name = "NAME",
        help = "The name of the remote to dump"
    )]
    pub remote: Option<String>,

    #[clap(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Override default config file path"
    )]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        value_name = "PROGRAM",
        help = "Program that dumps the graph as JSON [default: pw-dump]"
    )]
    pub command: Option<String>,

    #[clap(
        short,
        long,
        value_name = "MS",
        help = "Give up on the dump after this many milliseconds"
    )]
    pub timeout: Option<u64>,

    #[clap(
        long,
        value_name = "FRACTION",
        help = "Allowed deviation from 100% volume, e.g. 0.005"
    )]
    pub volume_tolerance: Option<f32>,

    #[clap(short, long, value_enum, help = "Output format")]
    pub format: Option<Format>,

    #[clap(
        long,
        value_name = "FILE",
        help = "Read a saved pw-dump from FILE ('-' for stdin) instead of running the program"
    )]
    pub dump: Option<PathBuf>,

    #[clap(
        short,
        long,
        action = ArgAction::Count,
        help = "Log more to stderr (repeat for more)"
    )]
    pub verbose: u8,
}

impl Opt {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
