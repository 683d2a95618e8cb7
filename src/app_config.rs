use anyhow::{anyhow, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codec::CaptionFormat;

/// Application configuration module
/// This module holds the settings of one conversion run: the pipeline
/// parameters derived from the rules file or the command line, and the
/// file-level options that surround them.
/// Latest offset-adjusted start time a caption may have to be kept
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cutoff {
    // @cutoff: Keep every caption
    #[default]
    Unbounded,
    // @cutoff: Keep captions starting at or before this many seconds
    Seconds(f64),
}

impl Cutoff {
    /// `None` means no cutoff
    pub fn from_seconds(seconds: Option<f64>) -> Self {
        match seconds {
            Some(seconds) if seconds.is_finite() => Self::Seconds(seconds),
            _ => Self::Unbounded,
        }
    }

    /// Whether a caption starting at `start_seconds` survives; the boundary itself is kept
    pub fn admits(&self, start_seconds: f64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Seconds(limit) => start_seconds <= *limit,
        }
    }
}

impl std::fmt::Display for Cutoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Seconds(seconds) => write!(f, "{}s", seconds),
        }
    }
}

/// Parameters of one pipeline run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Milliseconds added to every start and end timecode
    #[serde(default)]
    pub timing_offset_ms: i64,

    /// Cutoff on the shifted start time
    #[serde(default)]
    pub cutoff: Cutoff,

    /// Formats written for the converted document
    #[serde(default = "default_destination_formats")]
    pub destination_formats: Vec<CaptionFormat>,
}

impl PipelineConfig {
    pub fn new(timing_offset_ms: i64, cutoff: Cutoff, destination_formats: Vec<CaptionFormat>) -> Self {
        Self { timing_offset_ms, cutoff, destination_formats }
    }

    /// Validate the configuration, dropping duplicate formats while keeping their order
    pub fn validate(mut self) -> Result<Self> {
        if let Cutoff::Seconds(seconds) = self.cutoff {
            if seconds.is_nan() || seconds < 0.0 {
                return Err(anyhow!("Cutoff must be a non-negative number of seconds, got {}", seconds));
            }
        }

        let mut unique = Vec::with_capacity(self.destination_formats.len());
        for format in self.destination_formats {
            if !unique.contains(&format) {
                unique.push(format);
            }
        }
        if unique.is_empty() {
            return Err(anyhow!("At least one destination format is required"));
        }
        self.destination_formats = unique;

        Ok(self)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timing_offset_ms: 0,
            cutoff: Cutoff::Unbounded,
            destination_formats: default_destination_formats(),
        }
    }
}

/// File-level options of a conversion, as given on the command line
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConverterOptions {
    /// Caption file or directory to convert
    pub source: PathBuf,

    /// Rules file
    #[serde(default = "default_conversions_file")]
    pub conversions_file: PathBuf,

    /// Destination filename; extension, if any, is ignored
    #[serde(default)]
    pub dest_filename: Option<String>,

    /// Destination directory; defaults to the source directory
    #[serde(default)]
    pub dest_directory: Option<PathBuf>,

    /// Direct offset that replaces the rules file
    #[serde(default)]
    pub offset_override: Option<i64>,

    /// Formats to write
    #[serde(default = "default_destination_formats")]
    pub destination_formats: Vec<CaptionFormat>,

    /// Cutoff in seconds on the shifted start time
    #[serde(default)]
    pub cutoff: Cutoff,

    /// Files converted concurrently in batch mode
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl ConverterOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            conversions_file: default_conversions_file(),
            dest_filename: None,
            dest_directory: None,
            offset_override: None,
            destination_formats: default_destination_formats(),
            cutoff: Cutoff::Unbounded,
            jobs: default_jobs(),
            log_level: LogLevel::default(),
        }
    }

    pub fn with_conversions_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.conversions_file = path.into();
        self
    }

    pub fn with_dest_filename(mut self, name: impl Into<String>) -> Self {
        self.dest_filename = Some(name.into());
        self
    }

    pub fn with_dest_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest_directory = Some(dir.into());
        self
    }

    pub fn with_offset(mut self, offset_ms: i64) -> Self {
        self.offset_override = Some(offset_ms);
        self
    }

    pub fn with_formats(mut self, formats: Vec<CaptionFormat>) -> Self {
        self.destination_formats = formats;
        self
    }

    pub fn with_cutoff(mut self, cutoff: Cutoff) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Effective batch concurrency, never zero
    pub fn effective_jobs(&self) -> usize {
        self.jobs.max(1)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

pub const DEFAULT_CONVERSIONS_FILE: &str = "conversions.json";

fn default_conversions_file() -> PathBuf {
    PathBuf::from(DEFAULT_CONVERSIONS_FILE)
}

fn default_destination_formats() -> Vec<CaptionFormat> {
    vec![CaptionFormat::Vtt]
}

fn default_jobs() -> usize {
    4
}
