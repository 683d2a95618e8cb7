/*!
 * TTML / DFXP codec.
 *
 * Only the timed paragraphs matter here: every `<p>` element with a `begin`
 * attribute and either `end` or `dur` becomes a caption. Line breaks map to
 * `<br/>`, other inline markup (spans, styling) is flattened to its text.
 * Both flavours share the reader; the writer differs only in namespace.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::{CaptionCodec, CaptionFormat, decode_text};
use crate::document::{Caption, CaptionDocument};
use crate::errors::{CodecError, TimecodeError};
use crate::timecode::Timecode;

static PARAGRAPH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<p\b([^>]*?)(?:/>|>(.*?)</p\s*>)").unwrap()
});

static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static BREAK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br\b[^>]*/?>").unwrap());

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\n]+").unwrap());

static LANG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<tt\b[^>]*\bxml:lang\s*=\s*["']([^"']*)["']"#).unwrap()
});

static LANGUAGE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(?:-[A-Za-z0-9]{1,8})*$").unwrap()
});

// 12.5s / 1500ms / 2m / 1h offset-time expressions
static OFFSET_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(h|m|s|ms)$").unwrap()
});

/// Namespace variant written by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtmlFlavor {
    /// W3C TTML 1.0+
    Ttml,
    /// Legacy Distribution Format Exchange Profile
    Dfxp,
}

impl TtmlFlavor {
    fn namespace(&self) -> &'static str {
        match self {
            Self::Ttml => "http://www.w3.org/ns/ttml",
            Self::Dfxp => "http://www.w3.org/2006/10/ttaf1",
        }
    }

    fn format(&self) -> CaptionFormat {
        match self {
            Self::Ttml => CaptionFormat::Ttml,
            Self::Dfxp => CaptionFormat::Dfxp,
        }
    }
}

/// TTML/DFXP reader/writer
#[derive(Debug, Clone, Copy)]
pub struct TtmlCodec {
    flavor: TtmlFlavor,
}

impl TtmlCodec {
    pub fn new(flavor: TtmlFlavor) -> Self {
        Self { flavor }
    }

    fn parse(&self, text: &str) -> Result<CaptionDocument, CodecError> {
        if !text.contains("<tt") {
            return Err(CodecError::MissingHeader { format: self.flavor.format() });
        }

        let header = LANG_REGEX
            .captures(text)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        let mut document = CaptionDocument::new(header);

        for caps in PARAGRAPH_REGEX.captures_iter(text) {
            let attributes = &caps[1];
            let body = caps.get(2).map_or("", |m| m.as_str());
            let line = Self::line_of(text, caps.get(0).map_or(0, |m| m.start()));

            let mut begin = None;
            let mut end = None;
            let mut dur = None;
            for attr in ATTRIBUTE_REGEX.captures_iter(attributes) {
                let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
                match local_name(&attr[1]) {
                    "begin" => begin = Some(value),
                    "end" => end = Some(value),
                    "dur" => dur = Some(value),
                    _ => {}
                }
            }

            let Some(begin) = begin else {
                return Err(self.parse_error(line, "paragraph without begin attribute"));
            };
            let start = parse_time_expression(begin)?;
            let end = match (end, dur) {
                (Some(end), _) => parse_time_expression(end)?,
                (None, Some(dur)) => start
                    .checked_add(parse_time_expression(dur)?)
                    .ok_or_else(|| TimecodeError::OutOfRange(dur.to_string()))?,
                (None, None) => return Err(self.parse_error(line, "paragraph without end or dur attribute")),
            };

            document.push(Caption::new(start, end, paragraph_text(body)));
        }

        Ok(document)
    }

    fn parse_error(&self, line: usize, message: &str) -> CodecError {
        CodecError::Parse { format: self.flavor.format(), line, message: message.to_string() }
    }

    fn line_of(text: &str, offset: usize) -> usize {
        text[..offset].matches('\n').count() + 1
    }
}

impl CaptionCodec for TtmlCodec {
    fn read(&self, data: &[u8]) -> Result<CaptionDocument, CodecError> {
        self.parse(&decode_text(data)?)
    }

    fn write(&self, document: &CaptionDocument) -> Result<Vec<u8>, CodecError> {
        // Headers from other containers (e.g. WebVTT metadata) are not language tags
        let header = document.header.trim();
        let lang = if LANGUAGE_TAG_REGEX.is_match(header) { header } else { "en" };

        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        output.push_str(&format!(
            "<tt xml:lang=\"{}\" xmlns=\"{}\">\n",
            escape_xml(lang),
            self.flavor.namespace()
        ));
        output.push_str("  <body>\n    <div>\n");

        for caption in document {
            let text = caption
                .text
                .split('\n')
                .map(escape_xml)
                .collect::<Vec<_>>()
                .join("<br/>");
            output.push_str(&format!(
                "      <p begin=\"{}\" end=\"{}\">{}</p>\n",
                caption.start, caption.end, text
            ));
        }

        output.push_str("    </div>\n  </body>\n</tt>\n");
        Ok(output.into_bytes())
    }
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// Clock time (`HH:MM:SS(.fff)`) or offset time (`12.5s`, `1500ms`)
fn parse_time_expression(value: &str) -> Result<Timecode, TimecodeError> {
    let value = value.trim();
    if let Some(caps) = OFFSET_TIME_REGEX.captures(value) {
        let amount: f64 = caps[1].parse().map_err(|_| TimecodeError::Format(value.to_string()))?;
        let scale = match &caps[2] {
            "h" => 3_600_000.0,
            "m" => 60_000.0,
            "s" => 1_000.0,
            _ => 1.0,
        };
        return Ok(Timecode::from_millis((amount * scale).round() as u64));
    }

    // Clock times may carry more than three fractional digits
    let clock = match value.split_once('.') {
        Some((whole, fraction)) if fraction.chars().count() > 3 => {
            format!("{}.{}", whole, fraction.chars().take(3).collect::<String>())
        }
        _ => value.to_string(),
    };
    clock.parse()
}

fn paragraph_text(body: &str) -> String {
    // Source whitespace is insignificant; only <br/> produces a line break
    let collapsed = WHITESPACE_REGEX.replace_all(body, " ");
    let with_breaks = BREAK_REGEX.replace_all(&collapsed, "\n");
    let stripped = TAG_REGEX.replace_all(&with_breaks, "");

    stripped
        .split('\n')
        .map(|line| unescape_xml(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
