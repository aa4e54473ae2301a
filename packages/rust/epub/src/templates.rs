//! XML documents that make up the EPUB container.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use summarybook_shared::{Chapter, TocEntry};

use crate::EpubMetadata;

pub(crate) const MIMETYPE: &str = "application/epub+zip";

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Package document: metadata, manifest and spine (`nav` first, then chapters).
pub(crate) fn content_opf(
    meta: &EpubMetadata,
    chapters: &[Chapter],
    modified: DateTime<Utc>,
) -> String {
    let mut manifest = String::new();
    let mut spine = String::from(r#"    <itemref idref="nav"/>"#);
    spine.push('\n');

    for chapter in chapters {
        let id = chapter_id(chapter);
        manifest.push_str(&format!(
            "    <item id=\"{id}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            escape(&chapter.file_name)
        ));
        spine.push_str(&format!("    <itemref idref=\"{id}\"/>\n"));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id" xml:lang="{lang}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>"#,
        lang = escape(&meta.language),
        identifier = escape(&meta.identifier),
        title = escape(&meta.title),
        modified = modified.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// EPUB 3 navigation document.
pub(crate) fn nav_xhtml(meta: &EpubMetadata, toc: &[TocEntry]) -> String {
    let mut items = String::new();
    for entry in toc {
        items.push_str(&format!(
            "        <li><a href=\"{}\">{}</a></li>\n",
            escape(&entry.href),
            escape(&entry.title)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
  <head><title>{title}</title></head>
  <body>
    <nav epub:type="toc" id="id">
      <h2>{title}</h2>
      <ol>
{items}      </ol>
    </nav>
  </body>
</html>"#,
        lang = escape(&meta.language),
        title = escape(&meta.title),
    )
}

/// NCX table of contents for EPUB 2 readers.
pub(crate) fn toc_ncx(meta: &EpubMetadata, toc: &[TocEntry]) -> String {
    let mut points = String::new();
    for (i, entry) in toc.iter().enumerate() {
        points.push_str(&format!(
            "    <navPoint id=\"{id}\" playOrder=\"{order}\">\n      <navLabel><text>{title}</text></navLabel>\n      <content src=\"{href}\"/>\n    </navPoint>\n",
            id = escape(&entry.id),
            order = i + 1,
            title = escape(&entry.title),
            href = escape(&entry.href),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{identifier}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{points}  </navMap>
</ncx>"#,
        identifier = escape(&meta.identifier),
        title = escape(&meta.title),
    )
}

/// Full XHTML document for one chapter; `chapter.content` is inserted as-is.
pub(crate) fn chapter_xhtml(meta: &EpubMetadata, chapter: &Chapter) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="{lang}" xml:lang="{lang}">
  <head><title>{title}</title></head>
  <body>{content}</body>
</html>"#,
        lang = escape(&meta.language),
        title = escape(&chapter.title),
        content = chapter.content,
    )
}

/// Manifest id for a chapter file (`chap_3.xhtml` -> `chap_3`).
pub(crate) fn chapter_id(chapter: &Chapter) -> String {
    chapter
        .file_name
        .strip_suffix(".xhtml")
        .unwrap_or(&chapter.file_name)
        .to_string()
}
