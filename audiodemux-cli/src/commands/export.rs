//! WAV export command.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use audiodemux::export::write_wav_with;
use audiodemux::{open_path, OpenOptions};

use super::info::format_size;

/// Decode an audio asset to a PCM WAV file.
#[derive(Args, Debug)]
pub struct CmdExport {
    /// Path to the input audio file.
    pub input: PathBuf,

    /// Path of the WAV file to write.
    pub output: PathBuf,

    /// Overwrite the output file if it exists.
    #[arg(short = 'y', long)]
    pub overwrite: bool,

    /// Output a JSON summary instead of styled text.
    #[arg(long)]
    pub json: bool,
}

impl CmdExport {
    /// Execute the export command.
    pub fn run(&self) -> anyhow::Result<()> {
        if !self.input.exists() {
            anyhow::bail!("File not found: {}", self.input.display());
        }
        if self.output.exists() && !self.overwrite {
            anyhow::bail!(
                "Output file already exists: {}. Use -y to overwrite.",
                self.output.display()
            );
        }

        let mut pcm = open_path(&self.input, &OpenOptions::new())?;

        tracing::debug!(
            frequency = pcm.frequency,
            format = %pcm.format,
            data_size = pcm.data_size,
            "decoded stream opened"
        );

        let pb = if self.json {
            ProgressBar::hidden()
        } else {
            match pcm.data_size {
                Some(total) => {
                    let pb = ProgressBar::new(u64::from(total));
                    pb.set_style(
                        ProgressStyle::with_template(
                            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                        )?
                        .progress_chars("#>-"),
                    );
                    pb
                }
                None => {
                    let pb = ProgressBar::new_spinner();
                    pb.set_style(ProgressStyle::with_template(
                        "{spinner:.green} [{elapsed_precise}] {bytes} written",
                    )?);
                    pb.enable_steady_tick(Duration::from_millis(100));
                    pb
                }
            }
        };

        let file = File::create(&self.output)?;
        let mut out = BufWriter::new(file);
        let written = write_wav_with(&mut pcm, &mut out, |n| pb.set_position(n))?;
        pb.finish_and_clear();

        if self.json {
            let summary = serde_json::json!({
                "input": self.input.display().to_string(),
                "output": self.output.display().to_string(),
                "frequency": pcm.frequency,
                "format": pcm.format.to_string(),
                "pcm_bytes": written,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!();
            println!(
                "{} {} ({} of PCM at {} Hz {})",
                style("Wrote").green().bold(),
                self.output.display(),
                format_size(written),
                pcm.frequency,
                pcm.format
            );
            println!();
        }

        Ok(())
    }
}
