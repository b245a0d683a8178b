//! audiodemux CLI - inspect and export compressed game audio assets.

mod commands;

use clap::{Parser, Subcommand};

use commands::{CmdExport, CmdInfo};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "audiodemux")]
#[command(version)]
#[command(about = "Inspect and decode legacy game audio containers")]
#[command(long_about = "audiodemux identifies the container of an audio asset \
    (RIFF/WAVE, Ogg, FLAC, MP3), decodes it to PCM, and reports gapless trim \
    metadata.\n\n\
    EXAMPLES:\n    \
    audiodemux info music.wav\n    \
    audiodemux info music.mp3 --json\n    \
    audiodemux export music.flac out.wav")]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect an audio asset and print its decoded stream parameters
    Info(CmdInfo),
    /// Decode an audio asset and write it as a PCM WAV file
    Export(CmdExport),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Info(cmd) => cmd.run(),
        Commands::Export(cmd) => cmd.run(),
    }
}
