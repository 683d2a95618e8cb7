/*!
 * WebVTT codec.
 *
 * Reading keeps cue timings and text; cue identifiers and cue settings are
 * discarded, and NOTE/STYLE/REGION blocks are skipped. Anything following
 * the `WEBVTT` signature in the header block becomes the document header.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::{CaptionCodec, CaptionFormat, decode_text, split_blocks};
use crate::document::{Caption, CaptionDocument};
use crate::errors::CodecError;
use crate::timecode::Timecode;

static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)(?:\s+.*)?$").unwrap()
});

const SIGNATURE: &str = "WEBVTT";

/// WebVTT reader/writer
#[derive(Debug, Clone, Copy, Default)]
pub struct VttCodec;

impl VttCodec {
    fn parse(text: &str) -> Result<CaptionDocument, CodecError> {
        let blocks = split_blocks(text);
        let mut blocks = blocks.into_iter();

        let header = match blocks.next() {
            Some((_, lines)) if lines[0].starts_with(SIGNATURE) => {
                let first = &lines[0][SIGNATURE.len()..];
                if !first.is_empty() && !first.starts_with([' ', '\t']) {
                    return Err(CodecError::MissingHeader { format: CaptionFormat::Vtt });
                }
                for line in &lines[1..] {
                    if CUE_TIMING_REGEX.is_match(line) {
                        return Err(CodecError::Parse {
                            format: CaptionFormat::Vtt,
                            line: 2,
                            message: "cue found inside the header block".to_string(),
                        });
                    }
                }
                // Line structure is kept so that header metadata lines round-trip
                let mut header_lines = vec![first.trim()];
                header_lines.extend_from_slice(&lines[1..]);
                let header = header_lines.join("\n");
                if header.trim().is_empty() { String::new() } else { header }
            }
            Some(_) => return Err(CodecError::MissingHeader { format: CaptionFormat::Vtt }),
            None if text.trim_start().starts_with(SIGNATURE) => String::new(),
            None => return Err(CodecError::MissingHeader { format: CaptionFormat::Vtt }),
        };

        let mut document = CaptionDocument::new(header);

        for (line_no, lines) in blocks {
            if Self::is_metadata_block(lines[0]) {
                continue;
            }

            // Optional cue identifier precedes the timing line
            let timing_index = if lines[0].contains("-->") { 0 } else { 1 };
            let Some(timing) = lines.get(timing_index) else {
                return Err(CodecError::Parse {
                    format: CaptionFormat::Vtt,
                    line: line_no,
                    message: "cue identifier without timing line".to_string(),
                });
            };

            let caps = CUE_TIMING_REGEX.captures(timing).ok_or_else(|| CodecError::Parse {
                format: CaptionFormat::Vtt,
                line: line_no + timing_index,
                message: format!("invalid cue timing: {}", timing),
            })?;

            let start: Timecode = caps[1].parse()?;
            let end: Timecode = caps[2].parse()?;
            let text = lines[timing_index + 1..].join("\n");

            document.push(Caption::new(start, end, text));
        }

        Ok(document)
    }

    fn is_metadata_block(first_line: &str) -> bool {
        ["NOTE", "STYLE", "REGION"].iter().any(|keyword| {
            first_line == *keyword
                || first_line
                    .strip_prefix(keyword)
                    .is_some_and(|rest| rest.starts_with([' ', '\t']))
        })
    }
}

impl CaptionCodec for VttCodec {
    fn read(&self, data: &[u8]) -> Result<CaptionDocument, CodecError> {
        Self::parse(&decode_text(data)?)
    }

    fn write(&self, document: &CaptionDocument) -> Result<Vec<u8>, CodecError> {
        let mut output = String::from(SIGNATURE);
        if !document.header.is_empty() {
            // First header line shares the signature line, the rest follow it
            let mut header_lines = document.header.split('\n');
            if let Some(first) = header_lines.next().filter(|first| !first.is_empty()) {
                output.push(' ');
                output.push_str(first);
            }
            for line in header_lines {
                output.push('\n');
                output.push_str(line);
            }
        }
        output.push_str("\n\n");

        for caption in document {
            output.push_str(&format!("{} --> {}\n", caption.start, caption.end));
            output.push_str(&caption.text);
            output.push_str("\n\n");
        }

        Ok(output.into_bytes())
    }
}
