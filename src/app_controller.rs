use anyhow::{Result, Context, anyhow};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{ConverterOptions, PipelineConfig};
use crate::codec::{CaptionFormat, CodecRegistry};
use crate::errors::CaptionError;
use crate::file_utils::{FileManager, CONVERTED_SUFFIX};
use crate::pipeline::{ConversionOutcome, ConversionPipeline};
use crate::rules::{RuleSetConfig, SubstitutionRuleSet};

// @module: Application controller for caption conversion

/// A conversion whose inputs have all been validated
pub struct PreparedConversion {
    pub source: PathBuf,
    pub source_format: CaptionFormat,
    pub dest_directory: PathBuf,
    pub dest_stem: String,
    pub pipeline: ConversionPipeline,
    pub rules: SubstitutionRuleSet,
}

/// What a single-file run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub source: PathBuf,
    pub captions_read: usize,
    pub captions_written: usize,
    pub written: Vec<PathBuf>,
    pub failed: Vec<(CaptionFormat, String)>,
}

impl RunReport {
    /// True when every caption was dropped and nothing was written
    pub fn is_empty(&self) -> bool {
        self.captions_written == 0
    }
}

/// Totals of a folder run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub converted: usize,
    pub empty: usize,
    pub failed: usize,
    pub reports: Vec<RunReport>,
}

/// Main application controller for caption conversion
#[derive(Clone)]
pub struct Controller {
    // @field: Codecs shared by every run
    codecs: Arc<CodecRegistry>,
}

impl Controller {
    /// Create a controller with every built-in codec
    pub fn new() -> Self {
        Self::with_registry(CodecRegistry::with_defaults())
    }

    // @method: Create a controller with a custom codec table
    pub fn with_registry(registry: CodecRegistry) -> Self {
        Self { codecs: Arc::new(registry) }
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Validate every input of a conversion before any caption is touched.
    ///
    /// Checks run in order: source file, destination directory, destination
    /// formats, then the offset or rules file.
    pub fn prepare(&self, options: &ConverterOptions) -> Result<PreparedConversion> {
        let source = options.source.clone();
        let source_format = CaptionFormat::from_path(&source)
            .filter(|format| self.codecs.supports(*format) && FileManager::file_exists(&source))
            .ok_or(CaptionError::SourceNotFound)?;

        if let Some(dir) = &options.dest_directory {
            if !FileManager::dir_exists(dir) {
                return Err(CaptionError::DestinationDirectoryNotFound.into());
            }
        }
        let dest_directory = Self::output_directory(&source, options.dest_directory.as_deref());

        for format in &options.destination_formats {
            if !self.codecs.supports(*format) {
                return Err(CaptionError::UnsupportedFormat(format.to_string()).into());
            }
        }

        let (offset, rules) = match options.offset_override {
            Some(0) => return Err(CaptionError::ZeroOffset.into()),
            Some(offset) => {
                debug!("Using direct offset of {} ms, conversion rules are not loaded", offset);
                (offset, SubstitutionRuleSet::empty())
            }
            None => {
                let config = RuleSetConfig::load(&options.conversions_file)?;
                (config.offset, SubstitutionRuleSet::compile(&config.conversions)?)
            }
        };

        let pipeline_config = PipelineConfig::new(offset, options.cutoff, options.destination_formats.clone())
            .validate()
            .context("Invalid pipeline configuration")?;

        let dest_stem = FileManager::destination_stem(&source, options.dest_filename.as_deref(), &dest_directory);

        Ok(PreparedConversion {
            source,
            source_format,
            dest_directory,
            dest_stem,
            pipeline: ConversionPipeline::new(pipeline_config),
            rules,
        })
    }

    /// Convert a single caption file
    pub fn run(&self, options: &ConverterOptions) -> Result<RunReport> {
        let prepared = self.prepare(options)?;
        self.run_prepared(prepared)
    }

    /// Convert an already validated file
    pub fn run_prepared(&self, prepared: PreparedConversion) -> Result<RunReport> {
        let PreparedConversion { source, source_format, dest_directory, dest_stem, pipeline, mut rules } = prepared;

        let data = FileManager::read_bytes(&source)?;
        let document = self.codecs
            .reader(source_format)?
            .read(&data)
            .with_context(|| format!("Failed to parse caption file: {:?}", source))?;

        let mut report = RunReport {
            source: source.clone(),
            captions_read: document.len(),
            ..RunReport::default()
        };

        let converted = match pipeline.convert(&document, &mut rules) {
            ConversionOutcome::Converted(converted) => converted,
            ConversionOutcome::Empty => {
                warn!("No captions to write for {:?}", source);
                return Ok(report);
            }
        };
        report.captions_written = converted.len();

        for output in pipeline.emit(&converted, &self.codecs) {
            let path = FileManager::generate_output_path(&dest_directory, &dest_stem, output.format);
            let written = output
                .result
                .map_err(anyhow::Error::from)
                .and_then(|bytes| FileManager::write_to_file(&path, &bytes));

            match written {
                Ok(()) => {
                    info!("Wrote {} caption(s) to {:?}", report.captions_written, path);
                    report.written.push(path);
                }
                Err(e) => {
                    error!("Failed to write {:?}: {:#}", path, e);
                    report.failed.push((output.format, format!("{:#}", e)));
                }
            }
        }

        Ok(report)
    }

    /// Convert every caption file under a directory, `jobs` files at a time
    pub async fn run_folder(&self, options: &ConverterOptions) -> Result<BatchReport> {
        let start_time = std::time::Instant::now();
        let input_dir = options.source.clone();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        if let Some(dir) = &options.dest_directory {
            if !FileManager::dir_exists(dir) {
                return Err(CaptionError::DestinationDirectoryNotFound.into());
            }
        }

        // Outputs of earlier runs are not sources
        let files: Vec<PathBuf> = FileManager::find_caption_files(&input_dir)?
            .into_iter()
            .filter(|path| !Self::is_converted_output(path))
            .collect();

        if files.is_empty() {
            return Err(anyhow!("No caption files found in directory: {:?}", input_dir));
        }

        let (planned, colliding) = Self::plan_output_stems(files, options.dest_directory.as_deref());

        let mut batch = BatchReport::default();
        for file in &colliding {
            error!("Skipping {:?}: its output name collides with another file of the batch", file);
            batch.failed += 1;
        }

        let folder_pb = ProgressBar::new(planned.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));
        folder_pb.set_message("Converting captions");

        let mut runs = stream::iter(planned)
            .map(|(file, dest_stem)| {
                let controller = self.clone();
                let mut file_options = options.clone();
                file_options.source = file.clone();
                // A single name would make every output collide
                file_options.dest_filename = None;
                tokio::task::spawn_blocking(move || {
                    let result = controller.prepare(&file_options).and_then(|mut prepared| {
                        prepared.dest_stem = dest_stem;
                        controller.run_prepared(prepared)
                    });
                    (file, result)
                })
            })
            .buffer_unordered(options.effective_jobs());

        while let Some(joined) = runs.next().await {
            folder_pb.inc(1);
            match joined {
                Ok((_, Ok(report))) if report.is_empty() => {
                    batch.empty += 1;
                    batch.reports.push(report);
                }
                Ok((_, Ok(report))) => {
                    if report.failed.is_empty() { batch.converted += 1 } else { batch.failed += 1 }
                    batch.reports.push(report);
                }
                Ok((file, Err(e))) => {
                    error!("Error converting {:?}: {:#}", file, e);
                    batch.failed += 1;
                }
                Err(e) => {
                    error!("Conversion task failed: {}", e);
                    batch.failed += 1;
                }
            }
        }

        folder_pb.finish_with_message("Folder conversion complete");

        info!(
            "Folder conversion completed in {}: {} converted, {} empty, {} errors",
            Self::format_duration(start_time.elapsed()),
            batch.converted,
            batch.empty,
            batch.failed
        );

        Ok(batch)
    }

    /// Give every file of a batch its own output stem.
    ///
    /// Files that would share `<stem>-converted` in one output directory are
    /// renamed `<stem>-<ext>-converted`. Files whose stem still collides after
    /// renaming are returned in the second list and must not be converted.
    pub fn plan_output_stems(
        files: Vec<PathBuf>,
        dest_directory: Option<&Path>,
    ) -> (Vec<(PathBuf, String)>, Vec<PathBuf>) {
        let keyed: Vec<(PathBuf, PathBuf, String)> = files
            .into_iter()
            .map(|file| {
                let directory = Self::output_directory(&file, dest_directory);
                let stem = FileManager::destination_stem(&file, None, &directory);
                (file, directory, stem)
            })
            .collect();

        let default_counts = Self::count_stems(keyed.iter().map(|(_, dir, stem)| (dir, stem)));
        let renamed: Vec<(PathBuf, PathBuf, String)> = keyed
            .into_iter()
            .map(|(file, directory, stem)| {
                if default_counts[&(directory.clone(), stem.clone())] > 1 {
                    let qualified = Self::extension_qualified_stem(&file);
                    debug!("Output name {} is shared, using {} for {:?}", stem, qualified, file);
                    (file, directory, qualified)
                } else {
                    (file, directory, stem)
                }
            })
            .collect();

        let final_counts = Self::count_stems(renamed.iter().map(|(_, dir, stem)| (dir, stem)));
        let mut planned = Vec::new();
        let mut colliding = Vec::new();
        for (file, directory, stem) in renamed {
            if final_counts[&(directory, stem.clone())] > 1 {
                colliding.push(file);
            } else {
                planned.push((file, stem));
            }
        }

        (planned, colliding)
    }

    fn count_stems<'a, I>(keys: I) -> HashMap<(PathBuf, String), usize>
    where
        I: IntoIterator<Item = (&'a PathBuf, &'a String)>,
    {
        let mut counts = HashMap::new();
        for (directory, stem) in keys {
            *counts.entry((directory.clone(), stem.clone())).or_insert(0) += 1;
        }
        counts
    }

    fn extension_qualified_stem(source: &Path) -> String {
        let stem = source.file_stem().unwrap_or_default().to_string_lossy();
        let extension = source.extension().unwrap_or_default().to_string_lossy().to_lowercase();
        format!("{}-{}{}", stem, extension, CONVERTED_SUFFIX)
    }

    // Destination directory when given, else the source's own directory
    fn output_directory(source: &Path, dest_directory: Option<&Path>) -> PathBuf {
        match dest_directory {
            Some(dir) => dir.to_path_buf(),
            None => match source.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    fn is_converted_output(path: &Path) -> bool {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(CONVERTED_SUFFIX))
            .unwrap_or(false)
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
