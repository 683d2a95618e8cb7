/*!
 * Caption container formats.
 *
 * Each format implements `CaptionCodec`, turning raw bytes into a
 * `CaptionDocument` and back. The `CodecRegistry` maps a `CaptionFormat`
 * (usually derived from a file extension) to its codec.
 *
 * - `vtt`: WebVTT
 * - `srt`: SubRip
 * - `ttml`: TTML and its legacy DFXP flavour
 */

pub mod srt;
pub mod ttml;
pub mod vtt;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::CaptionDocument;
use crate::errors::{CaptionError, CodecError};

pub use srt::SrtCodec;
pub use ttml::{TtmlCodec, TtmlFlavor};
pub use vtt::VttCodec;

/// Supported caption containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    #[default]
    Vtt,
    Srt,
    Ttml,
    Dfxp,
}

impl CaptionFormat {
    /// Every format, in the order they are registered by default
    pub const ALL: [CaptionFormat; 4] = [Self::Vtt, Self::Srt, Self::Ttml, Self::Dfxp];

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Vtt => "vtt",
            Self::Srt => "srt",
            Self::Ttml => "ttml",
            Self::Dfxp => "dfxp",
        }
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for CaptionFormat {
    type Err = CaptionError;

    /// Accepts `vtt`, `.vtt`, `VTT`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "vtt" => Ok(Self::Vtt),
            "srt" => Ok(Self::Srt),
            "ttml" => Ok(Self::Ttml),
            "dfxp" => Ok(Self::Dfxp),
            _ => Err(CaptionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Reader and writer for one caption container
pub trait CaptionCodec: Send + Sync {
    /// Parse raw bytes into a canonical document
    fn read(&self, data: &[u8]) -> Result<CaptionDocument, CodecError>;

    /// Serialize a canonical document
    fn write(&self, document: &CaptionDocument) -> Result<Vec<u8>, CodecError>;
}

/// Capability table from format to codec
pub struct CodecRegistry {
    codecs: HashMap<CaptionFormat, Box<dyn CaptionCodec>>,
}

impl CodecRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self { codecs: HashMap::new() }
    }

    /// Registry with every built-in codec
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CaptionFormat::Vtt, VttCodec);
        registry.register(CaptionFormat::Srt, SrtCodec);
        registry.register(CaptionFormat::Ttml, TtmlCodec::new(TtmlFlavor::Ttml));
        registry.register(CaptionFormat::Dfxp, TtmlCodec::new(TtmlFlavor::Dfxp));
        registry
    }

    /// Register or replace the codec for `format`
    pub fn register<C: CaptionCodec + 'static>(&mut self, format: CaptionFormat, codec: C) {
        self.codecs.insert(format, Box::new(codec));
    }

    pub fn supports(&self, format: CaptionFormat) -> bool {
        self.codecs.contains_key(&format)
    }

    /// Codec used to read `format`
    pub fn reader(&self, format: CaptionFormat) -> Result<&dyn CaptionCodec, CaptionError> {
        self.get(format)
    }

    /// Codec used to write `format`
    pub fn writer(&self, format: CaptionFormat) -> Result<&dyn CaptionCodec, CaptionError> {
        self.get(format)
    }

    fn get(&self, format: CaptionFormat) -> Result<&dyn CaptionCodec, CaptionError> {
        self.codecs
            .get(&format)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| CaptionError::UnsupportedFormat(format.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Decode bytes as UTF-8, dropping a leading byte-order mark
pub(crate) fn decode_text(data: &[u8]) -> Result<String, CodecError> {
    let text = String::from_utf8(data.to_vec())?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Split text into blank-line separated blocks, keeping the 1-based line number of each block
pub(crate) fn split_blocks(text: &str) -> Vec<(usize, Vec<&str>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start_line = 1;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push((start_line, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start_line = index + 1;
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push((start_line, current));
    }

    blocks
}
