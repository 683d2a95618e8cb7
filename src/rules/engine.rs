/*!
 * Stateful substitution engine.
 *
 * Rules are compiled once into four buckets, applied to every caption in
 * this order:
 *
 * 1. Direct: whole-text equality lookup; a hit ends processing of the caption.
 * 2. Case-insensitive keywords.
 * 3. Case-sensitive keywords (sees the output of step 2).
 * 4. Contextual keywords, enabled per trigger phrase found in the previous
 *    caption's final text.
 *
 * The triggers found in each caption's final text are remembered for the
 * next call to `process`. Call `reset` before the first caption of a run.
 */

use std::collections::HashMap;

use log::{debug, trace};

use crate::errors::CaptionError;
use crate::rules::config::RawRule;
use crate::rules::matcher::{DEFAULT_SIZE_LIMIT, KeywordMatcher, TriggerSet};

/// A validated rule, tagged by matching strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionRule {
    /// Replace the whole caption text when it equals `key`
    Direct { key: String, replacement: String },

    /// Replace `key` anywhere in the text
    Simple { key: String, replacement: String, case_sensitive: bool },

    /// Replace `key` anywhere in the text, only after `previous` was seen in the prior caption
    Contextual { key: String, replacement: String, previous: String, case_sensitive: bool },
}

impl ConversionRule {
    /// Classify a raw record; `None` when `key` or `replacement` is missing.
    ///
    /// `directConversion: true` takes precedence over `previous`.
    pub fn from_raw(raw: &RawRule) -> Option<Self> {
        let key = raw.key.clone()?;
        let replacement = raw.replacement.clone()?;
        let case_sensitive = raw.case_sensitive.unwrap_or(false);

        if raw.direct_conversion.unwrap_or(false) {
            return Some(Self::Direct { key, replacement });
        }

        match raw.previous.as_deref() {
            Some(previous) if !previous.is_empty() => Some(Self::Contextual {
                key,
                replacement,
                previous: previous.to_string(),
                case_sensitive,
            }),
            _ => Some(Self::Simple { key, replacement, case_sensitive }),
        }
    }
}

/// Case-insensitive pass followed by a case-sensitive pass
#[derive(Debug, Clone, Default)]
struct KeywordPass {
    insensitive: Option<KeywordMatcher>,
    sensitive: Option<KeywordMatcher>,
}

impl KeywordPass {
    fn build(pairs: &[(String, String, bool)], size_limit: usize) -> Result<Self, regex::Error> {
        let select = |wanted: bool| {
            pairs
                .iter()
                .filter(move |(_, _, cs)| *cs == wanted)
                .map(|(k, r, _)| (k.as_str(), r.as_str()))
        };

        Ok(Self {
            insensitive: KeywordMatcher::build_with_size_limit(select(false), false, size_limit)?,
            sensitive: KeywordMatcher::build_with_size_limit(select(true), true, size_limit)?,
        })
    }

    fn apply(&self, text: String) -> String {
        let text = match &self.insensitive {
            Some(matcher) => matcher.replace_all(&text),
            None => text,
        };
        match &self.sensitive {
            Some(matcher) => matcher.replace_all(&text),
            None => text,
        }
    }

    fn rule_count(&self) -> usize {
        self.insensitive.as_ref().map_or(0, KeywordMatcher::len)
            + self.sensitive.as_ref().map_or(0, KeywordMatcher::len)
    }
}

/// Compiled rules plus the "previous caption" memory of one conversion run
#[derive(Debug, Clone, Default)]
pub struct SubstitutionRuleSet {
    direct: HashMap<String, String>,
    keywords: KeywordPass,
    /// One pass per distinct trigger phrase, in first-registration order
    contextual: Vec<KeywordPass>,
    triggers: Option<TriggerSet>,
    /// Trigger indices found in the previous caption's final text
    active_triggers: Vec<usize>,
}

impl SubstitutionRuleSet {
    /// A rule set that leaves every caption unchanged
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile raw rule records, silently dropping those missing `key` or `replacement`.
    ///
    /// Fails only when a bucket cannot be turned into a matcher.
    pub fn compile(records: &[RawRule]) -> Result<Self, CaptionError> {
        Self::compile_with_size_limit(records, DEFAULT_SIZE_LIMIT)
    }

    /// Same as `compile`, with an explicit compiled size limit per matcher
    pub fn compile_with_size_limit(records: &[RawRule], size_limit: usize) -> Result<Self, CaptionError> {
        let rules: Vec<ConversionRule> = records.iter().filter_map(ConversionRule::from_raw).collect();
        let skipped = records.len() - rules.len();
        if skipped > 0 {
            debug!("Skipped {} incomplete conversion rule(s)", skipped);
        }
        Self::build(rules, size_limit)
    }

    /// Compile already-classified rules
    pub fn from_rules(rules: Vec<ConversionRule>) -> Result<Self, CaptionError> {
        Self::build(rules, DEFAULT_SIZE_LIMIT)
    }

    fn build(rules: Vec<ConversionRule>, size_limit: usize) -> Result<Self, CaptionError> {
        let mut direct = HashMap::new();
        let mut simple: Vec<(String, String, bool)> = Vec::new();
        let mut trigger_phrases: Vec<String> = Vec::new();
        let mut grouped: Vec<Vec<(String, String, bool)>> = Vec::new();

        for rule in rules {
            match rule {
                ConversionRule::Direct { key, replacement } => {
                    direct.entry(key).or_insert(replacement);
                }
                ConversionRule::Simple { key, replacement, case_sensitive } => {
                    simple.push((key, replacement, case_sensitive));
                }
                ConversionRule::Contextual { key, replacement, previous, case_sensitive } => {
                    let slot = match trigger_phrases.iter().position(|p| *p == previous) {
                        Some(slot) => slot,
                        None => {
                            trigger_phrases.push(previous);
                            grouped.push(Vec::new());
                            grouped.len() - 1
                        }
                    };
                    grouped[slot].push((key, replacement, case_sensitive));
                }
            }
        }

        let rule_set = Self {
            direct,
            keywords: KeywordPass::build(&simple, size_limit)?,
            contextual: grouped
                .iter()
                .map(|pairs| KeywordPass::build(pairs, size_limit))
                .collect::<Result<Vec<_>, _>>()?,
            triggers: TriggerSet::build_with_size_limit(trigger_phrases.iter().map(String::as_str), size_limit)?,
            active_triggers: Vec::new(),
        };

        debug!(
            "Compiled conversion rules: {} direct, {} keyword, {} contextual trigger(s)",
            rule_set.direct.len(),
            rule_set.keywords.rule_count(),
            rule_set.contextual.len()
        );

        Ok(rule_set)
    }

    /// Forget the previous caption; call before the first caption of a run
    pub fn reset(&mut self) {
        self.active_triggers.clear();
    }

    /// Whether the set has no rule at all
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.keywords.rule_count() == 0 && self.contextual.is_empty()
    }

    /// Transform one caption's text. Must be called once per caption, in document order.
    pub fn process(&mut self, caption_text: &str) -> String {
        let output = match self.direct.get(caption_text) {
            Some(replacement) => replacement.clone(),
            None => {
                let text = self.keywords.apply(caption_text.to_string());
                self.active_triggers
                    .iter()
                    .filter_map(|&index| self.contextual.get(index))
                    .fold(text, |text, pass| pass.apply(text))
            }
        };

        self.active_triggers = match &self.triggers {
            Some(triggers) => triggers.matches(&output),
            None => Vec::new(),
        };

        trace!("{:?} -> {:?} (triggers {:?})", caption_text, output, self.active_triggers);
        output
    }
}
