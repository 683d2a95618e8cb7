/*!
 * Canonical in-memory caption document.
 *
 * Every codec reads into and writes from these types. Caption order is
 * significant and is never changed by the converter.
 */

use std::fmt;

use crate::timecode::Timecode;

/// A single timed text entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub start: Timecode,
    pub end: Timecode,
    pub text: String,
}

impl Caption {
    pub fn new(start: Timecode, end: Timecode, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {} {:?}", self.start, self.end, self.text)
    }
}

/// Ordered captions plus a provenance header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionDocument {
    /// Free-form header carried from the source container (e.g. text after `WEBVTT`)
    pub header: String,

    /// Captions in presentation order
    pub captions: Vec<Caption>,
}

impl CaptionDocument {
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into(), captions: Vec::new() }
    }

    pub fn with_captions(header: impl Into<String>, captions: Vec<Caption>) -> Self {
        Self { header: header.into(), captions }
    }

    pub fn push(&mut self, caption: Caption) {
        self.captions.push(caption);
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Caption> {
        self.captions.iter()
    }
}

impl<'a> IntoIterator for &'a CaptionDocument {
    type Item = &'a Caption;
    type IntoIter = std::slice::Iter<'a, Caption>;

    fn into_iter(self) -> Self::IntoIter {
        self.captions.iter()
    }
}
