//! Audio asset inspection command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use audiodemux::{open_path, OpenOptions, PropertyValue};

/// Decoded asset information for display.
#[derive(Debug, Clone, Serialize)]
pub struct AssetInfo {
    /// File path.
    pub file: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Container format.
    pub container: String,
    /// Codec name.
    pub codec: String,
    /// Sample rate in Hz.
    pub frequency: u32,
    /// Sample layout name.
    pub format: String,
    /// Channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Decoded PCM byte length, when statically known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_size: Option<u32>,
    /// Decoded duration in seconds, when statically known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// All stream properties.
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Inspect an audio asset.
#[derive(Args, Debug)]
pub struct CmdInfo {
    /// Path to the audio file.
    pub file: PathBuf,

    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

impl CmdInfo {
    /// Execute the info command.
    pub fn run(&self) -> anyhow::Result<()> {
        if !self.file.exists() {
            anyhow::bail!("File not found: {}", self.file.display());
        }

        let metadata = std::fs::metadata(&self.file)?;
        let file_size = metadata.len();

        let pcm = open_path(&self.file, &OpenOptions::new())?;

        let channels = pcm.format.channels();
        let bytes_per_frame = u32::from(pcm.format.bytes_per_frame());
        let duration_seconds = pcm
            .data_size
            .map(|size| f64::from(size) / f64::from(pcm.frequency * bytes_per_frame));

        let mut properties = BTreeMap::new();
        for (key, value) in pcm.properties.iter() {
            let json_value = match value {
                PropertyValue::Int(v) => serde_json::Value::from(*v),
                PropertyValue::Str(s) => serde_json::Value::from(s.as_str()),
            };
            properties.insert(key.to_string(), json_value);
        }

        let info = AssetInfo {
            file: self.file.display().to_string(),
            size_bytes: file_size,
            container: pcm
                .properties
                .get_string("container")
                .unwrap_or_else(|| "unknown".to_string()),
            codec: pcm
                .properties
                .get_string("codec")
                .unwrap_or_else(|| "unknown".to_string()),
            frequency: pcm.frequency,
            format: pcm.format.to_string(),
            channels,
            bits_per_sample: pcm.format.bits_per_sample(),
            data_size: pcm.data_size,
            duration_seconds,
            properties,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            self.print_asset_info(&info);
        }

        Ok(())
    }

    fn print_asset_info(&self, info: &AssetInfo) {
        println!();
        println!("{}", style("Asset Information").cyan().bold());
        println!();

        println!("  {:<16} {}", style("File:").white(), info.file);
        println!(
            "  {:<16} {}",
            style("Size:").white(),
            format_size(info.size_bytes)
        );
        println!("  {:<16} {}", style("Container:").white(), info.container);
        println!("  {:<16} {}", style("Codec:").white(), info.codec);
        println!(
            "  {:<16} {} Hz",
            style("Sample Rate:").white(),
            info.frequency
        );
        println!(
            "  {:<16} {} ({} ch, {}-bit)",
            style("Format:").white(),
            info.format,
            info.channels,
            info.bits_per_sample
        );

        if let Some(size) = info.data_size {
            println!(
                "  {:<16} {}",
                style("PCM Size:").white(),
                format_size(u64::from(size))
            );
        }

        if let Some(duration) = info.duration_seconds {
            println!(
                "  {:<16} {}",
                style("Duration:").white(),
                format_duration(duration)
            );
        }

        if !info.properties.is_empty() {
            println!();
            println!("{}", style("Properties:").cyan().bold());
            println!();
            for (key, value) in &info.properties {
                println!("  {:<22} {}", style(format!("{key}:")).dim(), value);
            }
        }

        println!();
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    let millis = ((seconds - total_seconds as f64) * 1000.0) as u64;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{}:{:02}.{:03}", minutes, secs, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00.000");
        assert_eq!(format_duration(61.5), "1:01.500");
        assert_eq!(format_duration(3661.0), "1:01:01.000");
    }

    #[test]
    fn test_asset_info_serialization() {
        let info = AssetInfo {
            file: "test.wav".to_string(),
            size_bytes: 1024,
            container: "wav".to_string(),
            codec: "pcm".to_string(),
            frequency: 44100,
            format: "stereo16".to_string(),
            channels: 2,
            bits_per_sample: 16,
            data_size: Some(980),
            duration_seconds: Some(0.005),
            properties: BTreeMap::new(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"file\":\"test.wav\""));
        assert!(json.contains("\"codec\":\"pcm\""));
    }

    #[test]
    fn test_data_size_omitted_when_unknown() {
        let info = AssetInfo {
            file: "test.ogg".to_string(),
            size_bytes: 1024,
            container: "ogg".to_string(),
            codec: "opus".to_string(),
            frequency: 48000,
            format: "stereo16".to_string(),
            channels: 2,
            bits_per_sample: 16,
            data_size: None,
            duration_seconds: None,
            properties: BTreeMap::new(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("data_size"));
        assert!(!json.contains("duration_seconds"));
    }
}
