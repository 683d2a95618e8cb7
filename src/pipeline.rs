/*!
 * Conversion pipeline.
 *
 * Runs a source document through offset, cutoff and substitution, caption by
 * caption and strictly in order, then fans the result out to one codec per
 * destination format. The pipeline never touches storage; writing the
 * serialized bytes is left to the caller.
 */

use log::{debug, error, warn};

use crate::app_config::PipelineConfig;
use crate::codec::{CaptionFormat, CodecRegistry};
use crate::document::{Caption, CaptionDocument};
use crate::errors::CaptionError;
use crate::rules::SubstitutionRuleSet;

/// Result of converting one document
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// At least one caption survived
    Converted(CaptionDocument),
    /// Every caption was dropped (or the source had none); nothing should be written
    Empty,
}

impl ConversionOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn document(&self) -> Option<&CaptionDocument> {
        match self {
            Self::Converted(document) => Some(document),
            Self::Empty => None,
        }
    }
}

/// Why a caption was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Shifted start or end would precede zero
    NegativeTimecode,
    /// Shifted start is past the cutoff
    PastCutoff,
}

/// Serialized output for one destination format
#[derive(Debug)]
pub struct EmittedOutput {
    pub format: CaptionFormat,
    pub result: Result<Vec<u8>, CaptionError>,
}

/// Offset + cutoff + substitution over an ordered caption sequence
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    config: PipelineConfig,
}

impl ConversionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Convert `source`, resetting and then driving the rule set's caption memory.
    ///
    /// Dropped captions do not leave gaps: output positions are contiguous.
    pub fn convert(&self, source: &CaptionDocument, rules: &mut SubstitutionRuleSet) -> ConversionOutcome {
        rules.reset();

        let mut output = CaptionDocument::new(source.header.clone());
        let mut dropped = 0usize;

        for (source_index, caption) in source.iter().enumerate() {
            match self.transform(caption, rules) {
                Ok(converted) => {
                    debug!("Caption {} -> output {}: {}", source_index, output.len(), converted);
                    output.push(converted);
                }
                Err(reason) => {
                    debug!("Dropping caption {} ({:?})", source_index, reason);
                    dropped += 1;
                }
            }
        }

        if output.is_empty() {
            warn!("No captions left after conversion ({} dropped); nothing will be written", dropped);
            return ConversionOutcome::Empty;
        }

        debug!("Converted {} caption(s), dropped {}", output.len(), dropped);
        ConversionOutcome::Converted(output)
    }

    /// Shift, filter and rewrite one caption.
    ///
    /// The rule set only sees captions that survive the timing checks, so the
    /// "previous caption" is always the previous emitted one.
    fn transform(&self, caption: &Caption, rules: &mut SubstitutionRuleSet) -> Result<Caption, DropReason> {
        let offset = self.config.timing_offset_ms;

        let start = caption.start.shift(offset).ok_or(DropReason::NegativeTimecode)?;
        let end = caption.end.shift(offset).ok_or(DropReason::NegativeTimecode)?;

        if !self.config.cutoff.admits(start.total_seconds()) {
            return Err(DropReason::PastCutoff);
        }

        Ok(Caption::new(start, end, rules.process(&caption.text)))
    }

    /// Serialize `document` once per destination format.
    ///
    /// Each format is attempted independently; a failure is reported in its
    /// own entry and does not stop the others.
    pub fn emit(&self, document: &CaptionDocument, codecs: &CodecRegistry) -> Vec<EmittedOutput> {
        self.config
            .destination_formats
            .iter()
            .map(|&format| {
                let result = codecs
                    .writer(format)
                    .and_then(|codec| codec.write(document).map_err(CaptionError::from));
                if let Err(e) = &result {
                    error!("Failed to write {} output: {}", format, e);
                }
                EmittedOutput { format, result }
            })
            .collect()
    }
}
