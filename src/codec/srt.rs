/*!
 * SubRip (SRT) codec.
 *
 * Blocks are `index`, `start --> end`, then text lines. Entries are kept in
 * file order; numbering is regenerated from 1 on write.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use log::warn;

use crate::codec::{CaptionCodec, CaptionFormat, decode_text, split_blocks};
use crate::document::{Caption, CaptionDocument};
use crate::errors::CodecError;
use crate::timecode::Timecode;

// @const: SRT timing line, `.` tolerated in place of `,`
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+:\d{1,2}:\d{1,2}[,.]\d{1,3})\s*-->\s*(\d+:\d{1,2}:\d{1,2}[,.]\d{1,3})").unwrap()
});

/// SubRip reader/writer
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtCodec;

impl SrtCodec {
    /// Parse SRT text into a document
    pub fn parse_srt_string(content: &str) -> Result<CaptionDocument, CodecError> {
        let mut document = CaptionDocument::default();

        for (line_no, lines) in split_blocks(content) {
            // Sequence number is optional in practice; only its position matters
            let timing_index = if lines[0].trim().parse::<usize>().is_ok() { 1 } else { 0 };

            let Some(caps) = lines.get(timing_index).and_then(|line| TIMESTAMP_REGEX.captures(line)) else {
                if timing_index == 1 && lines.len() == 1 {
                    warn!("Skipping SRT block at line {} with no timing", line_no);
                    continue;
                }
                return Err(CodecError::Parse {
                    format: CaptionFormat::Srt,
                    line: line_no + timing_index,
                    message: format!("expected timing line, found {:?}", lines.get(timing_index)),
                });
            };

            let start: Timecode = caps[1].parse()?;
            let end: Timecode = caps[2].parse()?;
            let text = lines[timing_index + 1..].join("\n");

            document.push(Caption::new(start, end, text));
        }

        Ok(document)
    }
}

impl CaptionCodec for SrtCodec {
    fn read(&self, data: &[u8]) -> Result<CaptionDocument, CodecError> {
        Self::parse_srt_string(&decode_text(data)?)
    }

    fn write(&self, document: &CaptionDocument) -> Result<Vec<u8>, CodecError> {
        let mut output = String::new();

        for (index, caption) in document.iter().enumerate() {
            output.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                index + 1,
                caption.start.format_with(','),
                caption.end.format_with(','),
                caption.text
            ));
        }

        Ok(output.into_bytes())
    }
}
