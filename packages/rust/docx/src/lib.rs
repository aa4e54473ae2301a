//! Minimal WordprocessingML (DOCX) writer and reader.
//!
//! Only what the aggregated document needs: headings, plain paragraphs and
//! reading paragraphs back with their style ids.

mod reader;
mod writer;

pub use reader::{parse_paragraphs, read_paragraphs};
pub use writer::DocxWriter;

/// Style id prefix of heading paragraphs (`Heading1` .. `Heading9`).
pub const HEADING_STYLE_PREFIX: &str = "Heading";

/// A single paragraph as written to or read from `word/document.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Paragraph style id (`w:pStyle`), `None` for the default style.
    pub style: Option<String>,
    /// Concatenated run text.
    pub text: String,
}

impl Paragraph {
    /// A default-style paragraph.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            style: None,
            text: text.into(),
        }
    }

    /// A heading paragraph at `level` (1 = top level).
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self {
            style: Some(format!("{HEADING_STYLE_PREFIX}{level}")),
            text: text.into(),
        }
    }

    /// Heading level parsed from the style id, if this is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        self.style
            .as_deref()?
            .strip_prefix(HEADING_STYLE_PREFIX)?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_from_style() {
        assert_eq!(Paragraph::heading("T", 1).heading_level(), Some(1));
        assert_eq!(Paragraph::heading("T", 3).heading_level(), Some(3));
        assert_eq!(Paragraph::plain("p").heading_level(), None);

        let titled = Paragraph {
            style: Some("Title".into()),
            text: "x".into(),
        };
        assert_eq!(titled.heading_level(), None);
    }

    #[test]
    fn write_then_read_preserves_styles_and_text() {
        let mut writer = DocxWriter::new();
        writer.add_heading("Chương <1> & mở đầu", 1);
        writer.add_paragraph("Đoạn văn \"một\".");
        writer.add_paragraph("");

        let bytes = writer.to_bytes().unwrap();
        let paragraphs = parse_paragraphs(&bytes).unwrap();

        assert_eq!(paragraphs, writer.paragraphs().to_vec());
    }
}
