//! Packaging stage: aggregated DOCX → EPUB.
//!
//! Every top-level heading paragraph opens a chapter; the paragraphs after it
//! become the chapter body.

use std::path::Path;

use tracing::{error, info, instrument};

use summarybook_docx::Paragraph;
use summarybook_epub::{EpubBuilder, EpubMetadata};
use summarybook_shared::{Chapter, EBook, Result};

use crate::toc;

/// Heading level that starts a new chapter.
const CHAPTER_HEADING_LEVEL: u8 = 1;

/// Escape `&`, `<` and `>` for XHTML text, in that order.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split paragraphs into chapters at `Heading1` boundaries.
///
/// Empty paragraphs are ignored, and so is anything before the first heading.
pub fn partition_chapters(paragraphs: &[Paragraph]) -> EBook {
    let mut chapters = Vec::new();
    let mut open: Option<(String, Vec<String>)> = None;

    for paragraph in paragraphs {
        let text = paragraph.text.trim();
        if text.is_empty() {
            continue;
        }

        if paragraph.heading_level() == Some(CHAPTER_HEADING_LEVEL) {
            if let Some((title, body)) = open.take() {
                chapters.push(render_chapter(chapters.len() + 1, title, &body));
            }
            open = Some((text.to_string(), Vec::new()));
        } else if let Some((_, body)) = open.as_mut() {
            body.push(text.to_string());
        }
    }

    if let Some((title, body)) = open {
        chapters.push(render_chapter(chapters.len() + 1, title, &body));
    }

    let toc = toc::build_toc(&chapters);
    EBook { chapters, toc }
}

fn render_chapter(number: usize, title: String, body: &[String]) -> Chapter {
    let mut content = format!("<h1>{}</h1>", escape_html(&title));
    for paragraph in body {
        content.push_str("<p>");
        content.push_str(&escape_html(paragraph));
        content.push_str("</p>");
    }

    Chapter {
        number,
        file_name: format!("chap_{number}.xhtml"),
        title,
        content,
    }
}

/// Read a DOCX document and partition it into an [`EBook`].
#[instrument(skip_all, fields(document = %document.display()))]
pub fn build_ebook(document: &Path) -> Result<EBook> {
    let paragraphs = summarybook_docx::read_paragraphs(document).inspect_err(|e| {
        error!(error = %e, "cannot read aggregated document");
    })?;
    let ebook = partition_chapters(&paragraphs);
    info!(chapters = ebook.chapters.len(), "chapters partitioned");
    Ok(ebook)
}

/// Build the e-book from `document` and write it to `epub_path`.
#[instrument(skip_all, fields(document = %document.display(), epub = %epub_path.display()))]
pub fn package(document: &Path, epub_path: &Path, metadata: EpubMetadata) -> Result<EBook> {
    let ebook = build_ebook(document)?;

    let mut builder = EpubBuilder::new(metadata);
    for chapter in &ebook.chapters {
        builder.add_chapter(chapter.clone());
    }
    builder.set_toc(ebook.toc.clone());
    builder.save(epub_path).inspect_err(|e| {
        error!(error = %e, "cannot write e-book");
    })?;

    Ok(ebook)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn heading(text: &str) -> Paragraph {
        Paragraph::heading(text, 1)
    }

    fn body(text: &str) -> Paragraph {
        Paragraph::plain(text)
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sb-pkg-{label}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn metadata() -> EpubMetadata {
        EpubMetadata {
            title: "Tóm tắt bằng AI".into(),
            identifier: "Tóm tắt bằng AI".into(),
            language: "vi".into(),
        }
    }

    #[test]
    fn escapes_each_character_once() {
        assert_eq!(escape_html("a < b > c & d"), "a &lt; b &gt; c &amp; d");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn chapters_follow_heading_boundaries() {
        let paragraphs = vec![
            body("preamble is dropped"),
            heading("One"),
            body("1a"),
            body(""),
            body("1b"),
            heading("Two"),
            heading("Three"),
            body("3a"),
        ];
        let ebook = partition_chapters(&paragraphs);

        let titles: Vec<_> = ebook.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(ebook.chapters[0].content, "<h1>One</h1><p>1a</p><p>1b</p>");
        assert_eq!(ebook.chapters[1].content, "<h1>Two</h1>");
        assert_eq!(ebook.chapters[2].file_name, "chap_3.xhtml");
        assert!(!ebook.chapters[0].content.contains("preamble"));
    }

    #[test]
    fn toc_mirrors_chapters() {
        let paragraphs = vec![heading("A"), body("x"), heading("B"), body("y")];
        let ebook = partition_chapters(&paragraphs);

        assert_eq!(ebook.toc.len(), ebook.chapters.len());
        for (entry, chapter) in ebook.toc.iter().zip(&ebook.chapters) {
            assert_eq!(entry.title, chapter.title);
            assert_eq!(entry.href, chapter.file_name);
        }
        assert_eq!(ebook.toc[1].id, "chap_2");
    }

    #[test]
    fn lower_level_headings_are_body_text() {
        let paragraphs = vec![heading("A"), Paragraph::heading("sub", 2), body("x")];
        let ebook = partition_chapters(&paragraphs);
        assert_eq!(ebook.chapters.len(), 1);
        assert_eq!(ebook.chapters[0].content, "<h1>A</h1><p>sub</p><p>x</p>");
    }

    #[test]
    fn empty_heading_is_not_a_chapter() {
        let paragraphs = vec![heading("A"), body("x"), heading("  "), body("y")];
        let ebook = partition_chapters(&paragraphs);
        assert_eq!(ebook.chapters.len(), 1);
        assert_eq!(ebook.chapters[0].content, "<h1>A</h1><p>x</p><p>y</p>");
    }

    #[test]
    fn paragraph_escaping_in_chapter_html() {
        let ebook = partition_chapters(&[heading("T & U"), body("<b> & </b>")]);
        let content = &ebook.chapters[0].content;
        assert_eq!(content, "<h1>T &amp; U</h1><p>&lt;b&gt; &amp; &lt;/b&gt;</p>");
        assert!(!content.contains("&amp;amp;"));
    }

    #[test]
    fn no_headings_means_no_chapters() {
        let ebook = partition_chapters(&[body("a"), body("b")]);
        assert!(ebook.chapters.is_empty());
        assert!(ebook.toc.is_empty());
    }

    #[test]
    fn package_round_trips_through_docx() {
        let dir = temp_dir("roundtrip");
        let docx = dir.join("doc.docx");
        let epub = dir.join("book.epub");

        let mut writer = summarybook_docx::DocxWriter::new();
        writer.add_heading("Một", 1);
        writer.add_paragraph("a < b");
        writer.add_paragraph("");
        writer.add_heading("Hai", 1);
        writer.add_paragraph("c");
        writer.save(&docx).unwrap();

        let ebook = package(&docx, &epub, metadata()).unwrap();
        assert_eq!(ebook.chapters.len(), 2);
        assert_eq!(ebook.chapters[0].content, "<h1>Một</h1><p>a &lt; b</p>");
        assert!(epub.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn package_without_headings_fails() {
        let dir = temp_dir("empty");
        let docx = dir.join("doc.docx");
        let epub = dir.join("book.epub");

        let mut writer = summarybook_docx::DocxWriter::new();
        writer.add_paragraph("only body");
        writer.save(&docx).unwrap();

        assert!(package(&docx, &epub, metadata()).is_err());
        assert!(!epub.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_document_fails() {
        let dir = temp_dir("missing");
        let result = build_ebook(&dir.join("nope.docx"));
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
