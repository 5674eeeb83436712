//! Slide deck extraction.
//!
//! Open XML decks are ZIP archives with one `ppt/slides/slide<N>.xml` entry per
//! slide. Legacy binary decks are scanned for printable text instead.

use crate::content::{ExtractedContent, TextPage};
use crate::error::{ConversionError, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

/// DrawingML namespace holding slide text runs.
pub const DRAWINGML_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";

const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

/// Signature of OLE2 compound files (legacy .ppt).
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Placeholder shown when a deck yields no text.
pub fn placeholder(source_name: &str) -> String {
    format!("(Slide content was extracted from {})", source_name)
}

/// Extract slide text, one page per slide.
pub fn extract(bytes: &[u8], source_name: &str) -> Result<ExtractedContent> {
    if bytes.starts_with(&OLE2_MAGIC) {
        warn!("Legacy binary deck {}; falling back to printable text scan", source_name);
        let text = scan_printable(bytes);
        let body = if text.trim().is_empty() {
            placeholder(source_name)
        } else {
            text
        };
        return Ok(ExtractedContent::plain(body));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConversionError::input("presentation", e.to_string()))?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if let Some(index) = slide_index(file.name()) {
            entries.push((index, file.name().to_string()));
        }
    }
    sort_slide_entries(&mut entries);
    debug!("Found {} slide entries", entries.len());

    let mut pages = Vec::with_capacity(entries.len());
    for (_, name) in &entries {
        let mut xml = String::new();
        archive
            .by_name(name)?
            .read_to_string(&mut xml)
            .map_err(|e| ConversionError::input("presentation", e.to_string()))?;
        pages.push(TextPage::new(slide_text(&xml)?));
    }

    Ok(ExtractedContent::paged_or_placeholder(
        pages,
        placeholder(source_name),
    ))
}

/// Numeric sort key of a slide entry, or `None` if `name` is not a slide.
/// A slide name without a parsable number sorts as 0.
pub fn slide_index(name: &str) -> Option<u32> {
    let middle = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(SLIDE_SUFFIX)?;
    if middle.contains('/') {
        return None;
    }
    Some(middle.parse::<u32>().unwrap_or(0))
}

/// Stable numeric sort: ties keep archive order.
pub fn sort_slide_entries(entries: &mut [(u32, String)]) {
    entries.sort_by_key(|(index, _)| *index);
}

/// Collect DrawingML text runs, one line per `a:p` paragraph.
pub fn slide_text(xml: &str) -> Result<Vec<String>> {
    let mut reader = NsReader::from_str(xml);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let drawing = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == DRAWINGML_NS);
        match event {
            Event::Start(e) if drawing => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if drawing && e.local_name().as_ref() == b"br" => {
                current.push('\n');
            }
            Event::End(e) if drawing => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    lines.extend(current.split('\n').map(str::to_string));
                    current.clear();
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ConversionError::input("presentation", e.to_string()))?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Text outside any paragraph still counts.
    if !in_paragraph && !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

/// Keep printable ASCII and line breaks, collapsing runs of three or more
/// line breaks to two.
pub fn scan_printable(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut newlines = 0;
    for &b in bytes {
        match b {
            b'\n' | b'\r' => {
                newlines += 1;
                if newlines <= 2 {
                    out.push('\n');
                }
            }
            0x20..=0x7E => {
                newlines = 0;
                out.push(b as char);
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn slide_xml(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            body
        )
    }

    fn deck(entries: &[(&str, String)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_slide_index() {
        assert_eq!(slide_index("ppt/slides/slide10.xml"), Some(10));
        assert_eq!(slide_index("ppt/slides/slide.xml"), Some(0));
        assert_eq!(slide_index("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_index("ppt/slides/slideLayouts/slide1.xml"), None);
        assert_eq!(slide_index("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn test_slides_sort_numerically_not_lexicographically() {
        let bytes = deck(&[
            ("ppt/slides/slide2.xml", slide_xml(&["two"])),
            ("ppt/slides/slide10.xml", slide_xml(&["ten"])),
            ("ppt/slides/slide1.xml", slide_xml(&["one"])),
        ]);
        match extract(&bytes, "deck.pptx").unwrap() {
            ExtractedContent::PagedText { pages } => {
                let firsts: Vec<&str> = pages.iter().map(|p| p.lines[0].as_str()).collect();
                assert_eq!(firsts, vec!["one", "two", "ten"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_deck_without_slides_yields_placeholder_page() {
        let bytes = deck(&[("docProps/core.xml", "<core/>".to_string())]);
        match extract(&bytes, "empty.pptx").unwrap() {
            ExtractedContent::PagedText { pages } => {
                assert_eq!(pages.len(), 1);
                assert_eq!(
                    pages[0].lines,
                    vec!["(Slide content was extracted from empty.pptx)".to_string()]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_slide_text_only_reads_drawingml_runs() {
        let xml = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
                            xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
                            xmlns:x="urn:other">
            <a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>&amp; bye</a:t></a:r></a:p>
            <a:p><x:t>ignored</x:t></a:p>
            <a:p><a:r><a:t>Line</a:t></a:r><a:br/><a:r><a:t>Break</a:t></a:r></a:p>
        </p:sld>"#;
        assert_eq!(
            slide_text(xml).unwrap(),
            vec!["Hello & bye", "", "Line", "Break"]
        );
    }

    #[test]
    fn test_legacy_deck_falls_back_to_printable_scan() {
        let mut bytes = OLE2_MAGIC.to_vec();
        bytes.extend_from_slice(b"\x00\x01Agenda\n\n\n\n\nItem\x02");
        match extract(&bytes, "old.ppt").unwrap() {
            ExtractedContent::PlainText { body } => assert_eq!(body, "Agenda\n\nItem"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_legacy_deck_without_text_uses_placeholder() {
        let bytes = OLE2_MAGIC.to_vec();
        match extract(&bytes, "blank.ppt").unwrap() {
            ExtractedContent::PlainText { body } => {
                assert_eq!(body, "(Slide content was extracted from blank.ppt)")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_archive_is_unsupported_input() {
        let err = extract(b"not a deck", "x.pptx").unwrap_err();
        assert!(matches!(
            err,
            ConversionError::UnsupportedInput {
                format: "presentation",
                ..
            }
        ));
    }
}
