//! Source article discovery.
//!
//! Walks the input tree, collects every `.txt` file in a stable order, and
//! reads articles one at a time so an unreadable file only affects itself.

use std::path::{Path, PathBuf};

use summarybook_shared::{Result, SourceArticle, SummaryBookError, word_count};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Extension (compared case-insensitively) of files treated as articles.
const ARTICLE_EXTENSION: &str = "txt";

/// A discovered article file that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path of the file, rooted at the input directory.
    pub path: PathBuf,
    /// Directory of the file relative to the input root (`.` for the root itself).
    pub relative_dir: PathBuf,
}

/// Recursively list `.txt` files under `root`.
///
/// Directory entries are visited sorted by file name, so the same tree always
/// yields the same order. Hidden entries (leading `.`) are skipped. Entries
/// below the root that cannot be read are logged and skipped; only a failure
/// on the root itself is an error.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_articles(root: &Path) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        return Err(SummaryBookError::validation(format!(
            "input directory {} does not exist",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with('.'))
                    .unwrap_or(false)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                return Err(SummaryBookError::io(path, e.into()));
            }
            Err(e) => {
                warn!(
                    path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    error = %e,
                    "skipping unreadable entry"
                );
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_article(entry.path()) {
            continue;
        }

        let path = entry.path().to_path_buf();
        files.push(DiscoveredFile {
            relative_dir: relative_dir(root, &path),
            path,
        });
    }

    info!(count = files.len(), "articles discovered");
    Ok(files)
}

/// Read a discovered file into a [`SourceArticle`].
pub fn read_article(file: &DiscoveredFile) -> Result<SourceArticle> {
    let text =
        std::fs::read_to_string(&file.path).map_err(|e| SummaryBookError::io(&file.path, e))?;
    let words = word_count(&text);
    debug!(path = %file.path.display(), words, "article read");

    Ok(SourceArticle {
        path: file.path.clone(),
        relative_dir: file.relative_dir.clone(),
        text,
        word_count: words,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_article(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTICLE_EXTENSION))
}

fn relative_dir(root: &Path, file: &Path) -> PathBuf {
    let parent = file.parent().unwrap_or(root);
    match parent.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sb-discovery-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn discovers_txt_files_recursively_in_stable_order() {
        let tmp = temp_dir();
        write(&tmp, "b.txt", "beta");
        write(&tmp, "a.TXT", "alpha");
        write(&tmp, "notes.md", "ignored");
        write(&tmp, "tech/c.txt", "gamma");
        write(&tmp, "tech/deep/d.txt", "delta");
        write(&tmp, ".hidden/e.txt", "hidden");

        let files = discover_articles(&tmp).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.txt", "c.txt", "d.txt"]);

        assert_eq!(files[0].relative_dir, PathBuf::from("."));
        assert_eq!(files[2].relative_dir, PathBuf::from("tech"));
        assert_eq!(files[3].relative_dir, PathBuf::from("tech").join("deep"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = temp_dir();
        write(&tmp, "a.txt", "alpha");
        write(&tmp, "locked/b.txt", "beta");
        write(&tmp, "z.txt", "zeta");

        let locked = tmp.join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read_dir(&locked).is_ok() {
            // Permission bits are not enforced (running as root).
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            let _ = std::fs::remove_dir_all(&tmp);
            return;
        }

        let result = discover_articles(&tmp);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let names: Vec<String> = result
            .unwrap()
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "z.txt"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_root_is_an_error() {
        let missing = std::env::temp_dir().join("sb-discovery-does-not-exist-42");
        let err = discover_articles(&missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn read_article_counts_words() {
        let tmp = temp_dir();
        write(&tmp, "x.txt", "one two  three\nfour");

        let files = discover_articles(&tmp).unwrap();
        let article = read_article(&files[0]).unwrap();
        assert_eq!(article.word_count, 4);
        assert_eq!(article.relative_dir, PathBuf::from("."));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_article_reports_unreadable_file() {
        let file = DiscoveredFile {
            path: std::env::temp_dir().join("sb-discovery-missing-file.txt"),
            relative_dir: PathBuf::from("."),
        };
        let err = read_article(&file).unwrap_err();
        assert!(matches!(err, SummaryBookError::Io { .. }));
    }
}
