//! DOCX paragraph reader.
//!
//! Streams `word/document.xml` with `quick-xml` and yields every `w:p` with
//! its `w:pStyle` id and concatenated `w:t` text. Tabs and breaks inside runs
//! become `\t` and `\n`.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};
use zip::ZipArchive;

use summarybook_shared::{Result, SummaryBookError};

use crate::Paragraph;

const DOCUMENT_PART: &str = "word/document.xml";

/// Read all paragraphs of the DOCX file at `path`, in document order.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_paragraphs(path: &Path) -> Result<Vec<Paragraph>> {
    let bytes = std::fs::read(path).map_err(|e| SummaryBookError::io(path, e))?;
    let paragraphs = parse_paragraphs(&bytes)?;
    debug!(count = paragraphs.len(), "paragraphs read");
    Ok(paragraphs)
}

/// Parse paragraphs from an in-memory DOCX package.
pub fn parse_paragraphs(bytes: &[u8]) -> Result<Vec<Paragraph>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SummaryBookError::Document(format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| SummaryBookError::Document(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| SummaryBookError::Document(format!("reading {DOCUMENT_PART}: {e}")))?;

    parse_document_xml(&xml)
}

/// Walk `word/document.xml` and collect paragraphs.
fn parse_document_xml(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<Paragraph> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(Paragraph::plain("")),
                b"w:pStyle" => set_style(&mut current, &e)?,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(Paragraph::plain("")),
                b"w:pStyle" => set_style(&mut current, &e)?,
                b"w:tab" => push_text(&mut current, "\t"),
                b"w:br" | b"w:cr" => push_text(&mut current, "\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| SummaryBookError::Document(format!("bad text node: {e}")))?;
                push_text(&mut current, &text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SummaryBookError::Document(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(paragraphs)
}

fn set_style(current: &mut Option<Paragraph>, e: &BytesStart<'_>) -> Result<()> {
    let Some(paragraph) = current.as_mut() else {
        return Ok(());
    };
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"w:val" {
            let value = attr
                .unescape_value()
                .map_err(|e| SummaryBookError::Document(format!("bad style attribute: {e}")))?;
            paragraph.style = Some(value.into_owned());
        }
    }
    Ok(())
}

fn push_text(current: &mut Option<Paragraph>, text: &str) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.text.push_str(text);
    }
}
