use std::collections::HashMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object};

use sha2::{Digest, Sha256};
use spire_deck::builder::PdfBuildError;
use spire_deck::chart::{encode_png, render_histogram, ChartOptions};
use spire_deck::fonts;
use spire_deck::report::{ReportError, ReportRequest};
use spire_deck::{AnalyzerConfig, DeckId, EnergyHistogram};

fn render_report(histogram: Option<&Path>, invalid: &[String]) -> Option<Vec<u8>> {
    render_report_with(histogram, invalid, false)
}

fn render_report_with(
    histogram: Option<&Path>,
    invalid: &[String],
    is_void: bool,
) -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let deck_id = DeckId::from_number(123_456_789, 9);
    let request = ReportRequest {
        prefix: "SpireDeck",
        deck_id: &deck_id,
        total_cost: 4,
        average_cost: Some(2.0),
        invalid_entries: invalid,
        is_void,
        histogram,
    };
    match request.render(None) {
        Ok(bytes) => Some(bytes),
        Err(ReportError::Build(PdfBuildError::FontLoad(err))) => {
            eprintln!("Skipping rendering assertions: {}", err);
            None
        }
        Err(other) => panic!("render report: {other}"),
    }
}

/// Parses the `<glyph> <unicode>` pairs of a ToUnicode CMap.
fn parse_to_unicode(cmap: &[u8]) -> HashMap<u16, char> {
    fn hex(token: &str) -> Option<u32> {
        let inner = token.strip_prefix('<')?.strip_suffix('>')?;
        u32::from_str_radix(inner, 16).ok()
    }

    let mut map = HashMap::new();
    for line in String::from_utf8_lossy(cmap).lines() {
        let mut tokens = line.split_whitespace();
        let (Some(glyph), Some(unicode), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            continue;
        };
        if let (Some(glyph), Some(ch)) = (hex(glyph), hex(unicode).and_then(char::from_u32)) {
            if let Ok(glyph) = u16::try_from(glyph) {
                map.insert(glyph, ch);
            }
        }
    }
    map
}

/// Extracts the text of the first page, one line per text section, with whitespace removed.
///
/// Text is written as two-byte glyph ids, so each font's ToUnicode map is used to decode it.
fn page_text(bytes: &[u8]) -> Vec<String> {
    let document = Document::load_mem(bytes).expect("lopdf should parse the report");
    let page_id = *document.get_pages().get(&1).expect("first page");

    let mut fonts: HashMap<Vec<u8>, HashMap<u16, char>> = HashMap::new();
    for (name, font) in document.get_page_fonts(page_id) {
        let Ok(stream) = font
            .get_deref(b"ToUnicode", &document)
            .and_then(Object::as_stream)
        else {
            continue;
        };
        let cmap = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        fonts.insert(name, parse_to_unicode(&cmap));
    }

    let content = document.get_page_content(page_id).expect("page content");
    let content = Content::decode(&content).expect("decode page content");
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut current: Option<&HashMap<u16, char>> = None;
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                current = operation
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name));
            }
            "Tj" | "TJ" => {
                let mut strings = Vec::new();
                for operand in &operation.operands {
                    match operand {
                        Object::String(bytes, _) => strings.push(bytes.clone()),
                        Object::Array(items) => strings.extend(items.iter().filter_map(|item| {
                            item.as_str().ok().map(<[u8]>::to_vec)
                        })),
                        _ => {}
                    }
                }
                let Some(map) = current else { continue };
                for glyph in strings.concat().chunks_exact(2) {
                    if let Some(ch) = map.get(&u16::from_be_bytes([glyph[0], glyph[1]])) {
                        if !ch.is_whitespace() && !ch.is_control() {
                            line.push(*ch);
                        }
                    }
                }
            }
            "ET" if !line.is_empty() => lines.push(std::mem::take(&mut line)),
            _ => {}
        }
    }
    lines
}

fn squash(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Finds the first line containing `text`, ignoring whitespace.
///
/// A glyph shared by several code points decodes to whichever one the CMap lists, so a
/// non-ASCII character in the page text matches any character of `text`.
fn position_of(lines: &[String], text: &str) -> Option<usize> {
    let needle: Vec<char> = squash(text).chars().collect();
    lines.iter().position(|line| {
        let line: Vec<char> = line.chars().collect();
        line.windows(needle.len()).any(|window| {
            window
                .iter()
                .zip(&needle)
                .all(|(found, wanted)| found == wanted || !found.is_ascii())
        })
    })
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    for tag in [
        "xmp:CreateDate",
        "xmp:ModifyDate",
        "xmp:MetadataDate",
        "xmpMM:DocumentID",
        "xmpMM:InstanceID",
        "xmpMM:VersionID",
    ] {
        let start = format!("<{}>", tag);
        let end = format!("</{}>", tag);
        scrub_xml(&mut normalized, start.as_bytes(), end.as_bytes());
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn report_renders_a_loadable_pdf() {
    let invalid = vec!["Foo:2".to_owned(), "Strike:9".to_owned()];
    let Some(bytes) = render_report(None, &invalid) else {
        eprintln!("Skipping report_renders_a_loadable_pdf: no font family found.");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
    let document = lopdf::Document::load_mem(&bytes).expect("lopdf should parse the report");
    assert_eq!(document.get_pages().len(), 1);
}

#[test]
fn report_text_follows_layout_order() {
    let invalid = vec!["Foo:2".to_owned(), "Strike:9".to_owned()];
    let Some(bytes) = render_report(None, &invalid) else {
        eprintln!("Skipping report_text_follows_layout_order: no font family found.");
        return;
    };
    let lines = page_text(&bytes);

    let order: Vec<usize> = [
        "Slay the Spire Deck Energy Cost Report",
        "Deck ID: 123456789",
        "Total Energy Cost: 4 energy",
        "Average Energy Cost: 2.00 energy",
        "Histogram not available for this report.",
        "Invalid Cards:",
        "Foo:2",
        "Strike:9",
    ]
    .iter()
    .map(|text| position_of(&lines, text).unwrap_or_else(|| panic!("{text:?} in {lines:?}")))
    .collect();
    assert!(
        order.windows(2).all(|pair| pair[0] < pair[1]),
        "unexpected order {order:?} in {lines:?}"
    );
    assert!(position_of(&lines, "Page 1").is_some());
}

#[test]
fn void_report_text_has_no_invalid_section() {
    let invalid = vec!["Foo:2".to_owned()];
    let Some(bytes) = render_report_with(None, &invalid, true) else {
        eprintln!("Skipping void_report_text_has_no_invalid_section: no font family found.");
        return;
    };
    let lines = page_text(&bytes);

    assert!(position_of(&lines, "Total Energy Cost: 4 energy").is_some());
    assert!(position_of(&lines, "Invalid Cards:").is_none(), "{lines:?}");
    assert!(position_of(&lines, "Foo:2").is_none(), "{lines:?}");
    assert!(position_of(&lines, "Average Energy Cost").is_none(), "{lines:?}");
}

#[test]
fn report_embeds_histogram_from_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let histogram = EnergyHistogram::from_costs(&[1, 3], &AnalyzerConfig::default());
    let chart = render_histogram(&histogram, &ChartOptions::default()).expect("render chart");
    let chart_path = dir.path().join("energy_histogram.png");
    std::fs::write(&chart_path, encode_png(&chart).expect("encode chart")).expect("write chart");

    let Some(without) = render_report(None, &[]) else {
        eprintln!("Skipping report_embeds_histogram_from_file: no font family found.");
        return;
    };
    let Some(with) = render_report(Some(&chart_path), &[]) else {
        return;
    };
    assert!(
        with.len() > without.len(),
        "embedding the histogram should grow the PDF ({} vs {})",
        with.len(),
        without.len()
    );
}

#[test]
fn unreadable_histogram_degrades_to_placeholder() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let bogus = dir.path().join("energy_histogram.png");
    std::fs::write(&bogus, b"not a png").expect("write bogus chart");

    let Some(bytes) = render_report(Some(&bogus), &[]) else {
        eprintln!("Skipping unreadable_histogram_degrades_to_placeholder: no font family found.");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn rendering_is_deterministic() {
    let invalid = vec!["Foo:2".to_owned()];
    let Some(bytes_a) = render_report(None, &invalid) else {
        eprintln!("Skipping rendering_is_deterministic: no font family found.");
        return;
    };
    let Some(bytes_b) = render_report(None, &invalid) else {
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}
