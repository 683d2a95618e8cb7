/*!
 * Multi-pattern keyword matching.
 *
 * A `KeywordMatcher` compiles every key of a bucket into one alternation
 * regex. Alternatives are ordered longest key first (stable, so equal
 * lengths keep registration order); with the leftmost-first semantics of
 * the `regex` crate this yields earliest-position, longest-key matching.
 * Each key gets its own capture group so the matched alternative maps
 * back to its replacement exactly, whatever the case of the matched text.
 *
 * Large rule sets produce large alternations, so matchers are compiled with
 * a raised size limit. A bucket that still cannot be compiled is an error,
 * never a silently empty matcher.
 */

use std::collections::HashSet;

use log::debug;
use regex::{Captures, Regex, RegexBuilder, RegexSet, RegexSetBuilder};

/// Compiled program size allowed for one bucket or trigger set
pub const DEFAULT_SIZE_LIMIT: usize = 256 * (1 << 20);

/// A compiled set of `key → replacement` substitutions sharing one case mode
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
    replacements: Vec<String>,
}

impl KeywordMatcher {
    /// Compile `(key, replacement)` pairs in registration order.
    ///
    /// Empty keys are ignored. When two keys are identical (case-folded for
    /// case-insensitive matchers) the first registered wins. Returns
    /// `Ok(None)` when nothing remains to match.
    pub fn build<'a, I>(pairs: I, case_sensitive: bool) -> Result<Option<Self>, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::build_with_size_limit(pairs, case_sensitive, DEFAULT_SIZE_LIMIT)
    }

    /// Same as `build`, with an explicit compiled size limit in bytes
    pub fn build_with_size_limit<'a, I>(
        pairs: I,
        case_sensitive: bool,
        size_limit: usize,
    ) -> Result<Option<Self>, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut seen = HashSet::new();
        let mut entries: Vec<(&str, &str)> = Vec::new();

        for (key, replacement) in pairs {
            if key.is_empty() {
                debug!("Ignoring empty substitution key");
                continue;
            }
            let identity = if case_sensitive { key.to_string() } else { key.to_lowercase() };
            if seen.insert(identity) {
                entries.push((key, replacement));
            }
        }

        if entries.is_empty() {
            return Ok(None);
        }

        // Stable sort keeps registration order among equal lengths
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

        let alternation = entries
            .iter()
            .map(|(key, _)| format!("({})", regex::escape(key)))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(!case_sensitive)
            .size_limit(size_limit)
            .build()?;

        Ok(Some(Self {
            pattern,
            replacements: entries.iter().map(|(_, r)| r.to_string()).collect(),
        }))
    }

    /// Number of distinct keys compiled into this matcher
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Whether any key occurs in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replace every non-overlapping occurrence in a single left-to-right scan
    pub fn replace_all(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| self.replacement_for(caps))
            .into_owned()
    }

    // Unknown group keeps the matched text unchanged
    fn replacement_for(&self, caps: &Captures) -> String {
        let replacement = caps
            .iter()
            .skip(1)
            .position(|group| group.is_some())
            .and_then(|index| self.replacements.get(index));

        match replacement {
            Some(replacement) => replacement.clone(),
            None => caps.get(0).map_or_else(String::new, |m| m.as_str().to_string()),
        }
    }
}

/// Detects which trigger phrases occur anywhere in a text, overlaps included
#[derive(Debug, Clone)]
pub struct TriggerSet {
    set: RegexSet,
}

impl TriggerSet {
    /// Compile trigger phrases; indices in `matches` follow the input order
    pub fn build<'a, I>(phrases: I) -> Result<Option<Self>, regex::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::build_with_size_limit(phrases, DEFAULT_SIZE_LIMIT)
    }

    pub fn build_with_size_limit<'a, I>(phrases: I, size_limit: usize) -> Result<Option<Self>, regex::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let patterns: Vec<String> = phrases.into_iter().map(regex::escape).collect();
        if patterns.is_empty() {
            return Ok(None);
        }

        let set = RegexSetBuilder::new(&patterns)
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()?;

        Ok(Some(Self { set }))
    }

    /// Indices of every trigger present in `text`, ascending
    pub fn matches(&self, text: &str) -> Vec<usize> {
        self.set.matches(text).into_iter().collect()
    }
}
