/*!
 * Error types for the caption-converter application.
 *
 * Fatal configuration problems are reported through `CaptionError`, codec
 * failures through `CodecError`, and malformed timecode strings through
 * `TimecodeError`. An empty conversion result is not an error; see
 * `pipeline::ConversionOutcome`.
 */

use thiserror::Error;

use crate::codec::CaptionFormat;

/// Errors raised while parsing a textual timecode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
    /// The string does not have the `[HH:]MM:SS.mmm` shape
    #[error("Invalid timecode format: {0}")]
    Format(String),

    /// A component is outside its radix (minutes/seconds >= 60)
    #[error("Timecode component out of range in: {0}")]
    OutOfRange(String),
}

/// Errors raised by a format codec while reading or writing a document
#[derive(Error, Debug)]
pub enum CodecError {
    /// The container signature (e.g. `WEBVTT`) is missing
    #[error("Missing {format} header")]
    MissingHeader {
        /// Format being read
        format: CaptionFormat,
    },

    /// A structural problem at a given line of the source
    #[error("Failed to parse {format} at line {line}: {message}")]
    Parse {
        /// Format being read
        format: CaptionFormat,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A timing expression could not be turned into a timecode
    #[error("Invalid timecode: {0}")]
    InvalidTimecode(#[from] TimecodeError),

    /// Input bytes are not UTF-8
    #[error("Caption data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Fatal conditions of a conversion run, detected before any caption is processed
#[derive(Error, Debug)]
pub enum CaptionError {
    /// Source captions path missing or carrying an unreadable extension
    #[error("Captions file not found")]
    SourceNotFound,

    /// Rules file missing or not a `.json` file
    #[error("Conversions file not found")]
    RuleSourceNotFound,

    /// Rules file has extra or missing top-level keys (or is not an object)
    #[error("Invalid conversions.json contents")]
    InvalidRuleSchema,

    /// `offset` is present but not an integer
    #[error("Offset must be integer")]
    InvalidOffsetType,

    /// `offset` is an integer that does not fit a signed 64-bit millisecond count
    #[error("Offset out of range")]
    OffsetOutOfRange,

    /// `conversions` is present but not a list
    #[error("Conversions must be list")]
    InvalidConversionsType,

    /// Requested output directory does not exist
    #[error("The destination directory does not exist.")]
    DestinationDirectoryNotFound,

    /// A direct offset of zero was requested
    #[error("Offset must be nonzero.")]
    ZeroOffset,

    /// No codec is registered for the requested extension
    #[error("Unsupported caption format: {0}")]
    UnsupportedFormat(String),

    /// A rule bucket could not be compiled into a matcher
    #[error("Failed to compile conversion rules: {0}")]
    RuleCompile(#[from] regex::Error),

    /// Rules file is not valid JSON
    #[error("Failed to parse conversions file: {0}")]
    RuleSyntax(#[from] serde_json::Error),

    /// Error from a format codec
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
}
