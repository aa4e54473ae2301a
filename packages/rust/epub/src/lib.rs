//! EPUB 3 writer.
//!
//! Packs pre-rendered chapter bodies, an XHTML navigation document and an NCX
//! table of contents into a single `.epub` archive. The `mimetype` entry is
//! written first and uncompressed, as the OCF container format requires.

mod templates;

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use summarybook_shared::{Chapter, Result, SummaryBookError, TocEntry};

/// Directory inside the archive that holds the package content.
const CONTENT_DIR: &str = "EPUB";

/// Book-level metadata written to the package document.
#[derive(Debug, Clone)]
pub struct EpubMetadata {
    /// `dc:title`.
    pub title: String,
    /// `dc:identifier` (the package unique identifier).
    pub identifier: String,
    /// `dc:language` and `xml:lang` of every document.
    pub language: String,
}

/// Collects chapters and a TOC, then writes the archive.
#[derive(Debug, Clone)]
pub struct EpubBuilder {
    metadata: EpubMetadata,
    chapters: Vec<Chapter>,
    toc: Vec<TocEntry>,
    modified: DateTime<Utc>,
}

impl EpubBuilder {
    pub fn new(metadata: EpubMetadata) -> Self {
        Self {
            metadata,
            chapters: Vec::new(),
            toc: Vec::new(),
            modified: Utc::now(),
        }
    }

    /// Override the `dcterms:modified` timestamp (defaults to now).
    pub fn modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    /// Append a chapter to the manifest and spine.
    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Replace the table of contents.
    pub fn set_toc(&mut self, toc: Vec<TocEntry>) {
        self.toc = toc;
    }

    /// Serialize the archive into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        add_entry(&mut zip, "mimetype", templates::MIMETYPE, stored)?;
        add_entry(&mut zip, "META-INF/container.xml", templates::CONTAINER_XML, deflated)?;
        add_entry(
            &mut zip,
            &format!("{CONTENT_DIR}/content.opf"),
            &templates::content_opf(&self.metadata, &self.chapters, self.modified),
            deflated,
        )?;
        add_entry(
            &mut zip,
            &format!("{CONTENT_DIR}/nav.xhtml"),
            &templates::nav_xhtml(&self.metadata, &self.toc),
            deflated,
        )?;
        add_entry(
            &mut zip,
            &format!("{CONTENT_DIR}/toc.ncx"),
            &templates::toc_ncx(&self.metadata, &self.toc),
            deflated,
        )?;

        for chapter in &self.chapters {
            add_entry(
                &mut zip,
                &format!("{CONTENT_DIR}/{}", chapter.file_name),
                &templates::chapter_xhtml(&self.metadata, chapter),
                deflated,
            )?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| SummaryBookError::Package(format!("finalize archive: {e}")))?;
        Ok(cursor.into_inner())
    }

    /// Write the e-book to `path` (temp file, then rename).
    #[instrument(skip_all, fields(path = %path.display(), chapters = self.chapters.len()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SummaryBookError::io(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "book.epub".into());
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        std::fs::write(&temp, &bytes).map_err(|e| SummaryBookError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| SummaryBookError::io(path, e))?;

        info!(size = bytes.len(), toc_entries = self.toc.len(), "wrote epub");
        Ok(())
    }

    /// Every TOC entry must point at a chapter, and chapter files must be unique.
    fn validate(&self) -> Result<()> {
        if self.chapters.is_empty() {
            return Err(SummaryBookError::Package("e-book has no chapters".into()));
        }

        let mut files = HashSet::new();
        for chapter in &self.chapters {
            if !files.insert(chapter.file_name.as_str()) {
                return Err(SummaryBookError::Package(format!(
                    "duplicate chapter file {}",
                    chapter.file_name
                )));
            }
        }

        for entry in &self.toc {
            if !files.contains(entry.href.as_str()) {
                return Err(SummaryBookError::Package(format!(
                    "TOC entry '{}' points at unknown file {}",
                    entry.title, entry.href
                )));
            }
        }

        Ok(())
    }
}

fn add_entry(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| SummaryBookError::Package(format!("{name}: {e}")))?;
    zip.write_all(content.as_bytes())
        .map_err(|e| SummaryBookError::Package(format!("{name}: {e}")))?;
    debug!(entry = name, size = content.len(), "added archive entry");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn metadata() -> EpubMetadata {
        EpubMetadata {
            title: "Tóm tắt & ghi chú".into(),
            identifier: "Tóm tắt bằng AI".into(),
            language: "vi".into(),
        }
    }

    fn chapter(n: usize, title: &str) -> Chapter {
        Chapter {
            number: n,
            title: title.into(),
            file_name: format!("chap_{n}.xhtml"),
            content: format!("<h1>{title}</h1><p>Body {n}</p>"),
        }
    }

    fn toc_entry(n: usize, title: &str) -> TocEntry {
        TocEntry {
            title: title.into(),
            href: format!("chap_{n}.xhtml"),
            id: format!("chap_{n}"),
        }
    }

    fn book() -> EpubBuilder {
        let mut builder = EpubBuilder::new(metadata());
        builder.add_chapter(chapter(1, "Một"));
        builder.add_chapter(chapter(2, "Hai"));
        builder.set_toc(vec![toc_entry(1, "Một"), toc_entry(2, "Hai")]);
        builder
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let bytes = book().to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn package_lists_nav_then_chapters_in_spine() {
        let bytes = book().to_bytes().unwrap();
        let opf = read_entry(&bytes, "EPUB/content.opf");

        let nav = opf.find(r#"<itemref idref="nav"/>"#).unwrap();
        let one = opf.find(r#"<itemref idref="chap_1"/>"#).unwrap();
        let two = opf.find(r#"<itemref idref="chap_2"/>"#).unwrap();
        assert!(nav < one && one < two);
        assert!(opf.contains("<dc:language>vi</dc:language>"));
        assert!(opf.contains("<dc:title>Tóm tắt &amp; ghi chú</dc:title>"));
    }

    #[test]
    fn modified_timestamp_is_written_to_package() {
        use chrono::TimeZone;

        let stamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let bytes = book().modified(stamp).to_bytes().unwrap();
        let opf = read_entry(&bytes, "EPUB/content.opf");

        assert!(opf.contains(r#"<meta property="dcterms:modified">2024-01-02T03:04:05Z</meta>"#));
    }

    #[test]
    fn nav_and_ncx_mirror_toc() {
        let bytes = book().to_bytes().unwrap();

        let nav = read_entry(&bytes, "EPUB/nav.xhtml");
        assert_eq!(nav.matches("<li>").count(), 2);
        assert!(nav.find("chap_1.xhtml").unwrap() < nav.find("chap_2.xhtml").unwrap());

        let ncx = read_entry(&bytes, "EPUB/toc.ncx");
        assert_eq!(ncx.matches("<navPoint ").count(), 2);
        assert!(ncx.contains(r#"<navPoint id="chap_2" playOrder="2">"#));
    }

    #[test]
    fn chapter_documents_embed_content() {
        let bytes = book().to_bytes().unwrap();
        let chap = read_entry(&bytes, "EPUB/chap_2.xhtml");
        assert!(chap.contains("<body><h1>Hai</h1><p>Body 2</p></body>"));
        assert!(chap.contains(r#"xml:lang="vi""#));
    }

    #[test]
    fn rejects_empty_book() {
        let err = EpubBuilder::new(metadata()).to_bytes().unwrap_err();
        assert!(err.to_string().contains("no chapters"));
    }

    #[test]
    fn rejects_dangling_toc_entry() {
        let mut builder = book();
        builder.set_toc(vec![toc_entry(9, "Missing")]);
        let err = builder.to_bytes().unwrap_err();
        assert!(err.to_string().contains("unknown file chap_9.xhtml"));
    }

    #[test]
    fn save_writes_archive() {
        let dir = std::env::temp_dir().join(format!("sb-epub-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("book.epub");

        book().save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_entry(&bytes, "mimetype"), "application/epub+zip");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
