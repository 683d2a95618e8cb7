/*!
 * Tests for the stateful substitution engine
 */

use caption_converter::errors::CaptionError;
use caption_converter::rules::{ConversionRule, KeywordMatcher, RawRule, SubstitutionRuleSet};

fn process_all(rules: &mut SubstitutionRuleSet, captions: &[&str]) -> Vec<String> {
    rules.reset();
    captions.iter().map(|text| rules.process(text)).collect()
}

/// Test that a direct rule wins over a simple rule for the same text
#[test]
fn test_process_withDirectAndSimpleRule_shouldPreferDirect() {
    let mut rules = SubstitutionRuleSet::compile(&[
        RawRule::simple("Hello", "Hi"),
        RawRule::direct("Hello", "Welcome!"),
    ]).unwrap();

    assert_eq!(rules.process("Hello"), "Welcome!");
    assert_eq!(rules.process("Hello there"), "Hi there");
}

/// Test that direct rules only match the whole caption text
#[test]
fn test_process_withDirectRuleOnPartialText_shouldLeaveUnchanged() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::direct("Hello", "Welcome!")]).unwrap();
    assert_eq!(rules.process("Hello!"), "Hello!");
}

/// Test that a contextual rule fires after its trigger was seen
#[test]
fn test_process_withContextualTriggerInPreviousCaption_shouldReplace() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();

    let output = process_all(&mut rules, &["I saw a cat.", "I fed it."]);
    assert_eq!(output, vec!["I saw a cat.", "I fed the cat."]);
}

/// Test that a contextual rule stays idle without its trigger
#[test]
fn test_process_withoutContextualTrigger_shouldLeaveUnchanged() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();

    let output = process_all(&mut rules, &["I saw a dog.", "I fed it."]);
    assert_eq!(output, vec!["I saw a dog.", "I fed it."]);
}

/// Test that a trigger only affects the immediately following caption
#[test]
fn test_process_withTriggerTwoCaptionsBack_shouldLeaveUnchanged() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();

    let output = process_all(&mut rules, &["A cat.", "Nothing here.", "I fed it."]);
    assert_eq!(output[2], "I fed it.");
}

/// Test that a trigger in the current caption does not enable its own rules
#[test]
fn test_process_withTriggerInSameCaption_shouldLeaveUnchanged() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();
    assert_eq!(rules.process("The cat did it."), "The cat did it.");
}

/// Test that triggers are detected in the rewritten text, including direct results
#[test]
fn test_process_withTriggerProducedByDirectRule_shouldEnableContextual() {
    let mut rules = SubstitutionRuleSet::compile(&[
        RawRule::direct("Meow", "A cat speaks."),
        RawRule::contextual("it", "the cat", "cat"),
    ]).unwrap();

    let output = process_all(&mut rules, &["Meow", "it purrs"]);
    assert_eq!(output, vec!["A cat speaks.", "the cat purrs"]);
}

/// Test that trigger detection ignores case
#[test]
fn test_process_withUppercaseTrigger_shouldEnableContextual() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();

    let output = process_all(&mut rules, &["A CAT!", "Pet it."]);
    assert_eq!(output[1], "Pet the cat.");
}

/// Test that reset forgets the previous caption
#[test]
fn test_reset_afterTriggerCaption_shouldForgetTrigger() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::contextual("it", "the cat", "cat")]).unwrap();

    rules.process("I saw a cat.");
    rules.reset();
    assert_eq!(rules.process("I fed it."), "I fed it.");
}

/// Test that incomplete records are skipped and the complete one is active
#[test]
fn test_compile_withIncompleteRecords_shouldOnlyActivateCompleteRule() {
    let records = vec![
        RawRule { key: Some("a".to_string()), ..RawRule::default() },
        RawRule { replacement: Some("b".to_string()), ..RawRule::default() },
        RawRule::simple("x", "y"),
    ];

    let mut rules = SubstitutionRuleSet::compile(&records).unwrap();
    assert!(!rules.is_empty());
    assert_eq!(rules.process("a x b"), "a y b");
}

/// Test that simple rules ignore case unless flagged case-sensitive
#[test]
fn test_process_withCaseModes_shouldHonorCaseSensitivity() {
    let mut rules = SubstitutionRuleSet::compile(&[
        RawRule::simple("colour", "color"),
        RawRule::simple("Bob", "Robert").case_sensitive(),
    ]).unwrap();

    assert_eq!(rules.process("COLOUR for Bob and bob"), "color for Robert and bob");
}

/// Test that the case-sensitive pass sees the output of the case-insensitive pass
#[test]
fn test_process_withChainedBuckets_shouldApplyInsensitiveFirst() {
    let mut rules = SubstitutionRuleSet::compile(&[
        RawRule::simple("Dog", "Wolf").case_sensitive(),
        RawRule::simple("cat", "Dog"),
    ]).unwrap();

    assert_eq!(rules.process("cat"), "Wolf");
}

/// Test that a bucket is a single scan and does not re-match its own output
#[test]
fn test_process_withChainedKeysInOneBucket_shouldNotRescan() {
    let mut rules = SubstitutionRuleSet::compile(&[RawRule::simple("a", "b"), RawRule::simple("b", "c")]).unwrap();
    assert_eq!(rules.process("ab"), "bc");
}

/// Test that an empty rule set is the identity
#[test]
fn test_process_withEmptyRuleSet_shouldReturnInput() {
    let mut rules = SubstitutionRuleSet::empty();
    assert!(rules.is_empty());
    assert_eq!(rules.process("Nothing changes"), "Nothing changes");
}

/// Test that directConversion takes precedence over previous
#[test]
fn test_fromRaw_withDirectAndPrevious_shouldClassifyAsDirect() {
    let raw = RawRule { direct_conversion: Some(true), ..RawRule::contextual("Hi", "Hello", "cat") };
    assert_eq!(
        ConversionRule::from_raw(&raw),
        Some(ConversionRule::Direct { key: "Hi".to_string(), replacement: "Hello".to_string() })
    );
}

/// Test that an empty previous phrase makes an ordinary keyword rule
#[test]
fn test_fromRaw_withEmptyPrevious_shouldClassifyAsSimple() {
    let raw = RawRule::contextual("it", "this", "");
    assert_eq!(
        ConversionRule::from_raw(&raw),
        Some(ConversionRule::Simple { key: "it".to_string(), replacement: "this".to_string(), case_sensitive: false })
    );
}

/// Test that the keyword matcher prefers the longest key at a position
#[test]
fn test_keywordMatcher_withPrefixKeys_shouldPreferLongest() {
    let matcher = KeywordMatcher::build([("cat", "dog"), ("catalog", "index")], false).unwrap().unwrap();
    assert!(matcher.is_match("CATALOG"));
    assert_eq!(matcher.replace_all("the catalog has a cat"), "the index has a dog");
}

/// Test that a matcher too large for its size limit is an error, not a missing bucket
#[test]
fn test_compile_withTinySizeLimit_shouldReturnRuleCompileError() {
    let records = [RawRule::simple("colour", "color"), RawRule::contextual("it", "the cat", "cat")];

    let result = SubstitutionRuleSet::compile_with_size_limit(&records, 16);

    assert!(matches!(result, Err(CaptionError::RuleCompile(_))));
}

/// Test that the keyword matcher reports a build failure
#[test]
fn test_keywordMatcher_withTinySizeLimit_shouldReturnError() {
    let result = KeywordMatcher::build_with_size_limit([("colour", "color"), ("favourite", "favorite")], false, 16);
    assert!(result.is_err());
}

/// Test that a large rules file compiles and still applies every rule
#[test]
fn test_compile_withTenThousandKeys_shouldApplyRules() {
    let mut records: Vec<RawRule> = (0..10_000)
        .map(|i| RawRule::simple(&format!("keyword{:05}", i), &format!("term{:05}", i)))
        .collect();
    records.push(RawRule::simple("colour", "color"));

    let mut rules = SubstitutionRuleSet::compile(&records).unwrap();

    assert_eq!(rules.process("the colour of keyword09999"), "the color of term09999");
}
