//! DOCX package writer.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::escape::escape;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use summarybook_shared::{Result, SummaryBookError};

use crate::Paragraph;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Builds a DOCX document paragraph by paragraph.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    paragraphs: Vec<Paragraph>,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heading paragraph (`level` 1 is the top level).
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) {
        self.paragraphs.push(Paragraph::heading(text, level));
    }

    /// Append a default-style paragraph. An empty string gives a blank line.
    pub fn add_paragraph(&mut self, text: impl Into<String>) {
        self.paragraphs.push(Paragraph::plain(text));
    }

    /// Paragraphs added so far.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, String); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
            ("word/styles.xml", styles_xml(max_heading_level(&self.paragraphs))),
            ("word/document.xml", document_xml(&self.paragraphs)),
        ];

        for (name, content) in &parts {
            zip.start_file(*name, options)
                .map_err(|e| SummaryBookError::Document(format!("{name}: {e}")))?;
            zip.write_all(content.as_bytes())
                .map_err(|e| SummaryBookError::Document(format!("{name}: {e}")))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| SummaryBookError::Document(format!("finalize archive: {e}")))?;
        Ok(cursor.into_inner())
    }

    /// Write the document to `path` (temp file, then rename).
    #[instrument(skip_all, fields(path = %path.display(), paragraphs = self.paragraphs.len()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SummaryBookError::io(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.docx".into());
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp, &bytes).map_err(|e| SummaryBookError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| SummaryBookError::io(path, e))?;

        debug!(size = bytes.len(), "wrote docx");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// XML parts
// ---------------------------------------------------------------------------

fn max_heading_level(paragraphs: &[Paragraph]) -> u8 {
    paragraphs
        .iter()
        .filter_map(Paragraph::heading_level)
        .max()
        .unwrap_or(1)
}

fn document_xml(paragraphs: &[Paragraph]) -> String {
    let mut xml = String::with_capacity(paragraphs.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<w:document xmlns:w="{WORD_NS}"><w:body>"#));

    for paragraph in paragraphs {
        xml.push_str("<w:p>");
        if let Some(style) = &paragraph.style {
            xml.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, escape(style)));
        }
        if !paragraph.text.is_empty() {
            xml.push_str(&format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                escape(&paragraph.text)
            ));
        }
        xml.push_str("</w:p>");
    }

    xml.push_str("<w:sectPr/></w:body></w:document>");
    xml
}

fn styles_xml(max_level: u8) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{WORD_NS}">"#));
    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
    );

    for level in 1..=max_level.clamp(1, 9) {
        // Sizes in half-points: 14pt for level 1, shrinking by 1pt per level.
        let size = 28u32.saturating_sub(2 * u32::from(level - 1)).max(22);
        xml.push_str(&format!(
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="{outline}"/></w:pPr><w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr></w:style>"#,
            outline = level - 1,
        ));
    }

    xml.push_str("</w:styles>");
    xml
}
