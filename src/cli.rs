use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pvtk::demo::{Config, Mode};
use pvtk::Encoding;

/// Write one small unstructured grid per worker thread as VTK XML files.
#[derive(Parser)]
#[command(
    name = "parallel-vtk-writer",
    version,
    about = "Write one small unstructured grid per worker thread as VTK XML files"
)]
pub struct Cli {
    /// Output layout: `U` per-piece files, `P` multi-piece dataset, `B` multi-block
    /// dataset. Only the first character is read, anything else selects `U`.
    /// A value starting with `-` must follow `--`, otherwise it is read as an option.
    pub mode: Option<String>,

    /// How data arrays are stored in the `.vtu` pieces.
    #[arg(short, long, value_enum, default_value_t = EncodingArg::Binary)]
    pub encoding: EncodingArg,

    /// Directory the files are written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of worker threads (0 for one per logical core).
    #[arg(short = 'j', long, default_value_t = 0)]
    pub threads: usize,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Encodings selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncodingArg {
    Ascii,
    Base64,
    Binary,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Ascii => Encoding::Ascii,
            EncodingArg::Base64 => Encoding::Base64,
            EncodingArg::Binary => Encoding::Binary,
        }
    }
}

impl Cli {
    pub fn into_config(self) -> Config {
        Config {
            mode: Mode::from_arg(self.mode.as_deref()),
            encoding: self.encoding.into(),
            output_dir: self.output_dir,
            threads: self.threads,
        }
    }
}
