/*!
 * Tests for the caption format codecs
 */

use std::path::Path;
use caption_converter::codec::{CaptionCodec, CaptionFormat, CodecRegistry, SrtCodec, TtmlCodec, TtmlFlavor, VttCodec};
use caption_converter::document::{Caption, CaptionDocument};
use caption_converter::errors::{CaptionError, CodecError, TimecodeError};
use caption_converter::timecode::Timecode;
use crate::common::{document, tc};

fn write_string(codec: &dyn CaptionCodec, document: &CaptionDocument) -> String {
    String::from_utf8(codec.write(document).unwrap()).unwrap()
}

/// Test that WebVTT cues are read with identifiers, settings and notes discarded
#[test]
fn test_vttRead_withIdentifiersSettingsAndNotes_shouldKeepCues() {
    let input = "WEBVTT\n\nNOTE this is a comment\n\nintro\n00:00:01.000 --> 00:00:02.500 align:start line:0\nFirst line\nSecond line\n\n00:03.000 --> 00:04.000\nShort form\n";

    let document = VttCodec.read(input.as_bytes()).unwrap();

    assert_eq!(document.header, "");
    assert_eq!(document.len(), 2);
    assert_eq!(document.captions[0], Caption::new(tc("00:00:01.000"), tc("00:00:02.500"), "First line\nSecond line"));
    assert_eq!(document.captions[1].start, tc("00:00:03.000"));
    assert_eq!(document.captions[1].text, "Short form");
}

/// Test that a file without the WEBVTT signature is rejected
#[test]
fn test_vttRead_withoutSignature_shouldReturnMissingHeader() {
    let result = VttCodec.read(b"00:00:01.000 --> 00:00:02.000\nHello\n");
    assert!(matches!(result, Err(CodecError::MissingHeader { format: CaptionFormat::Vtt })));
}

/// Test that header metadata survives a read/write cycle
#[test]
fn test_vttWrite_withHeaderMetadata_shouldPreserveHeader() {
    let input = "WEBVTT - Title\nKind: captions\n\n00:00:01.000 --> 00:00:02.000\nHi\n\n";

    let document = VttCodec.read(input.as_bytes()).unwrap();
    assert_eq!(document.header, "- Title\nKind: captions");
    assert_eq!(write_string(&VttCodec, &document), input);
}

/// Test the exact WebVTT output layout
#[test]
fn test_vttWrite_withTwoCaptions_shouldRenderCues() {
    let doc = document(&[("00:00:01.000", "00:00:02.000", "One"), ("00:00:03.000", "00:00:04.000", "Two\nlines")]);

    assert_eq!(
        write_string(&VttCodec, &doc),
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nOne\n\n00:00:03.000 --> 00:00:04.000\nTwo\nlines\n\n"
    );
}

/// Test that SRT entries are read in file order, with a BOM tolerated
#[test]
fn test_srtRead_withBomAndEntries_shouldReadAllEntries() {
    let input = "\u{feff}1\n00:00:01,000 --> 00:00:04,000\nThis is a test.\n\n2\n00:00:05,000 --> 00:00:09,000\nTwo\nlines\n";

    let document = SrtCodec.read(input.as_bytes()).unwrap();

    assert_eq!(document.len(), 2);
    assert_eq!(document.captions[0].text, "This is a test.");
    assert_eq!(document.captions[1], Caption::new(tc("00:00:05.000"), tc("00:00:09.000"), "Two\nlines"));
}

/// Test that a broken timing line is a parse error with its line number
#[test]
fn test_srtRead_withBrokenTiming_shouldReturnParseError() {
    let result = SrtCodec::parse_srt_string("1\nnot a timing\ntext\n");
    assert!(matches!(result, Err(CodecError::Parse { format: CaptionFormat::Srt, line: 2, .. })));
}

/// Test that SRT output is renumbered from one with comma separators
#[test]
fn test_srtWrite_withCaptions_shouldNumberFromOne() {
    let doc = document(&[("00:00:01.000", "00:00:02.000", "One"), ("01:00:03.000", "01:00:04.500", "Two")]);

    assert_eq!(
        write_string(&SrtCodec, &doc),
        "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n2\n01:00:03,000 --> 01:00:04,500\nTwo\n\n"
    );
}

/// Test that TTML paragraphs are read with end, dur and inline markup
#[test]
fn test_ttmlRead_withMixedTimingAndMarkup_shouldReadParagraphs() {
    let input = r#"<?xml version="1.0" encoding="utf-8"?>
<tt xml:lang="fr" xmlns="http://www.w3.org/ns/ttml" xmlns:tts="http://www.w3.org/ns/ttml#styling">
  <body>
    <div>
      <p begin="00:00:01.000" end="00:00:02.000">Bonjour<br/>tout le monde</p>
      <p begin="3s" dur="1500ms"><span tts:fontStyle="italic">Fish &amp; chips</span></p>
    </div>
  </body>
</tt>"#;

    let document = TtmlCodec::new(TtmlFlavor::Ttml).read(input.as_bytes()).unwrap();

    assert_eq!(document.header, "fr");
    assert_eq!(document.len(), 2);
    assert_eq!(document.captions[0].text, "Bonjour\ntout le monde");
    assert_eq!(document.captions[1], Caption::new(tc("00:00:03.000"), tc("00:00:04.500"), "Fish & chips"));
}

/// Test that a paragraph without timing is rejected
#[test]
fn test_ttmlRead_withoutBegin_shouldReturnParseError() {
    let input = "<tt xmlns=\"http://www.w3.org/ns/ttml\"><body><div><p>Untimed</p></div></body></tt>";
    let result = TtmlCodec::new(TtmlFlavor::Ttml).read(input.as_bytes());
    assert!(matches!(result, Err(CodecError::Parse { format: CaptionFormat::Ttml, .. })));
}

/// Test that a clock time with a multi-byte fraction is rejected cleanly
#[test]
fn test_ttmlRead_withMultiByteFraction_shouldReturnInvalidTimecode() {
    let input = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="00:00:01.12é4" end="00:00:02.000">Hi</p></div></body></tt>"#;
    let result = TtmlCodec::new(TtmlFlavor::Ttml).read(input.as_bytes());
    assert!(matches!(result, Err(CodecError::InvalidTimecode(TimecodeError::Format(_)))));
}

/// Test that dur is added to a begin with a very large hour count
#[test]
fn test_ttmlRead_withLargeBeginAndDur_shouldComputeEnd() {
    let input = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="9999999999999:00:00.000" dur="1s">Late</p></div></body></tt>"#;

    let document = TtmlCodec::new(TtmlFlavor::Ttml).read(input.as_bytes()).unwrap();

    assert_eq!(document.captions[0].end, Timecode::new(9_999_999_999_999, 0, 1, 0));
}

/// Test that an end past the largest hour count is an out-of-range timecode
#[test]
fn test_ttmlRead_withEndPastHourRange_shouldReturnOutOfRange() {
    let input = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="18446744073709551615:59:59.999" dur="1s">Never</p></div></body></tt>"#;
    let result = TtmlCodec::new(TtmlFlavor::Ttml).read(input.as_bytes());
    assert!(matches!(result, Err(CodecError::InvalidTimecode(TimecodeError::OutOfRange(_)))));
}

/// Test that TTML output escapes text, joins lines with breaks and keeps the language
#[test]
fn test_ttmlWrite_withLanguageHeader_shouldRenderParagraphs() {
    let mut doc = document(&[("00:00:01.000", "00:00:02.000", "Fish & chips\n<now>")]);
    doc.header = "de".to_string();

    let output = write_string(&TtmlCodec::new(TtmlFlavor::Ttml), &doc);

    assert!(output.contains(r#"<tt xml:lang="de" xmlns="http://www.w3.org/ns/ttml">"#));
    assert!(output.contains(r#"<p begin="00:00:01.000" end="00:00:02.000">Fish &amp; chips<br/>&lt;now&gt;</p>"#));
}

/// Test that DFXP uses its own namespace and a non-language header falls back to English
#[test]
fn test_dfxpWrite_withVttHeader_shouldUseLegacyNamespaceAndDefaultLanguage() {
    let mut doc = document(&[("00:00:01.000", "00:00:02.000", "Hi")]);
    doc.header = "Kind: captions".to_string();

    let output = write_string(&TtmlCodec::new(TtmlFlavor::Dfxp), &doc);

    assert!(output.contains(r#"<tt xml:lang="en" xmlns="http://www.w3.org/2006/10/ttaf1">"#));
}

/// Test that captions survive a trip from SRT to every other format
#[test]
fn test_crossFormat_withSrtSource_shouldPreserveCaptions() {
    let registry = CodecRegistry::with_defaults();
    let source = SrtCodec
        .read(b"1\n00:00:01,000 --> 00:00:02,000\nFirst & only\nline two\n")
        .unwrap();

    for format in CaptionFormat::ALL {
        let codec = registry.writer(format).unwrap();
        let bytes = codec.write(&source).unwrap();
        let reread = registry.reader(format).unwrap().read(&bytes).unwrap();
        assert_eq!(reread.captions, source.captions, "format {}", format);
    }
}

/// Test that format names are parsed with or without a dot, in any case
#[test]
fn test_captionFormat_fromStr_shouldAcceptExtensions() {
    assert_eq!(".SRT".parse::<CaptionFormat>().unwrap(), CaptionFormat::Srt);
    assert_eq!("dfxp".parse::<CaptionFormat>().unwrap(), CaptionFormat::Dfxp);
    assert!(matches!("mp4".parse::<CaptionFormat>(), Err(CaptionError::UnsupportedFormat(_))));
    assert_eq!(CaptionFormat::from_path(Path::new("talk.ttml")), Some(CaptionFormat::Ttml));
    assert_eq!(CaptionFormat::from_path(Path::new("talk.txt")), None);
}

/// Test that the registry only dispatches formats it has codecs for
#[test]
fn test_codecRegistry_withCustomTable_shouldReportUnsupportedFormats() {
    let mut registry = CodecRegistry::new();
    registry.register(CaptionFormat::Vtt, VttCodec);

    assert!(registry.supports(CaptionFormat::Vtt));
    assert!(!registry.supports(CaptionFormat::Srt));
    assert!(matches!(registry.writer(CaptionFormat::Srt), Err(CaptionError::UnsupportedFormat(_))));
    assert!(CaptionFormat::ALL.iter().all(|format| CodecRegistry::with_defaults().supports(*format)));
}
