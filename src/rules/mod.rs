/*!
 * Conversion rules: loading, compilation and stateful application.
 *
 * - `config`: reads and validates the rules file
 * - `matcher`: compiled multi-pattern keyword matching
 * - `engine`: the `SubstitutionRuleSet` applied caption by caption
 */

pub mod config;
pub mod engine;
pub mod matcher;

// Re-export main types
pub use config::{RawRule, RuleSetConfig};
pub use engine::{ConversionRule, SubstitutionRuleSet};
pub use matcher::KeywordMatcher;
