//! TOC (Table of Contents) builder.
//!
//! The e-book TOC is flat: one entry per chapter, in chapter order, pointing
//! at the chapter's XHTML file.

use tracing::{debug, instrument};

use summarybook_shared::{Chapter, TocEntry};

/// Build TOC entries 1:1 from chapters.
#[instrument(skip_all, fields(chapter_count = chapters.len()))]
pub fn build_toc(chapters: &[Chapter]) -> Vec<TocEntry> {
    let toc: Vec<TocEntry> = chapters
        .iter()
        .map(|chapter| TocEntry {
            title: chapter.title.clone(),
            href: chapter.file_name.clone(),
            id: entry_id(chapter.number),
        })
        .collect();

    debug!(entries = toc.len(), "TOC built from chapters");
    toc
}

/// Navigation id for chapter `number` (`chap_N`).
pub fn entry_id(number: usize) -> String {
    format!("chap_{number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(number: usize, title: &str) -> Chapter {
        Chapter {
            number,
            title: title.into(),
            file_name: format!("chap_{number}.xhtml"),
            content: String::new(),
        }
    }

    #[test]
    fn one_entry_per_chapter_in_order() {
        let chapters = vec![chapter(1, "B"), chapter(2, "A"), chapter(3, "C")];
        let toc = build_toc(&chapters);

        let titles: Vec<_> = toc.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(toc[2].href, "chap_3.xhtml");
        assert_eq!(toc[2].id, "chap_3");
    }

    #[test]
    fn empty_chapters_give_empty_toc() {
        assert!(build_toc(&[]).is_empty());
    }
}
