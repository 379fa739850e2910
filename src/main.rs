use clap::{Parser, Subcommand};
use dwvw_lib::{self as dwvw, DwvwError};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compress or decompress AIFF/AIFC audio using the DWVW codec.
#[derive(Parser)]
#[command(name = "dwvw", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an AIFF or uncompressed AIFC file into a DWVW AIFC file.
    Compress {
        input: PathBuf,
        output: PathBuf,

        /// Bits per compressed sample (1-32). Defaults to 12.
        #[arg(short = 'w', long = "word-size")]
        word_size: Option<u32>,
    },
    /// Decompress a DWVW AIFC file back into an uncompressed AIFC file.
    Decompress { input: PathBuf, output: PathBuf },
}

fn run() -> dwvw::R<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            word_size,
        } => {
            let input = input
                .to_str()
                .ok_or_else(|| DwvwError::malformed("input path is not valid UTF-8"))?;
            let output = output
                .to_str()
                .ok_or_else(|| DwvwError::malformed("output path is not valid UTF-8"))?;
            dwvw::run_compress(input, output, word_size)
        }
        Commands::Decompress { input, output } => {
            let input = input
                .to_str()
                .ok_or_else(|| DwvwError::malformed("input path is not valid UTF-8"))?;
            let output = output
                .to_str()
                .ok_or_else(|| DwvwError::malformed("output path is not valid UTF-8"))?;
            dwvw::run_decompress(input, output)
        }
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("dwvw: {err}");
            ExitCode::FAILURE
        }
    }
}
