//! Raw document discovery and decoding.

use crate::types::RawDocument;
use mingyu_core::{AppError, AppResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents read from a source directory, plus what was skipped.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub documents: Vec<RawDocument>,
    pub skipped: Vec<PathBuf>,
    pub bytes_read: u64,
}

/// Find every `*.txt` file under `dir`, ordered by file name.
pub fn discover_documents(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Source directory not found: {:?}",
            dir
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    tracing::debug!("Discovered {} documents under {:?}", paths.len(), dir);
    Ok(paths)
}

/// Decode raw bytes as UTF-8, falling back to GBK.
///
/// Malformed GBK sequences become U+FFFD. A leading BOM is dropped.
pub fn decode_bytes(bytes: &[u8], path: &Path) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::GBK.decode(bytes);
            if had_errors {
                tracing::warn!(
                    "{:?} is neither valid UTF-8 nor clean GBK; malformed bytes replaced",
                    path
                );
            } else {
                tracing::warn!("{:?} is not valid UTF-8; decoded as GBK", path);
            }
            decoded.into_owned()
        }
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Read one document; the entry name is the file stem.
pub fn read_document(path: &Path) -> AppResult<(RawDocument, u64)> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::Encoding(format!("Unusable file name: {:?}", path)))?
        .to_string();

    let bytes = std::fs::read(path)?;
    let size = bytes.len() as u64;

    Ok((
        RawDocument {
            name,
            text: decode_bytes(&bytes, path),
        },
        size,
    ))
}

/// Read every document under `dir`.
///
/// Unreadable files are logged and skipped. Entry names must be unique, so a
/// file whose stem was already read (in another subdirectory) is skipped too.
pub fn read_documents(dir: &Path) -> AppResult<ReadOutcome> {
    let mut outcome = ReadOutcome::default();
    let mut names = HashSet::new();

    for path in discover_documents(dir)? {
        match read_document(&path) {
            Ok((document, _)) if names.contains(&document.name) => {
                tracing::warn!(
                    "Skipping {:?}: entry '{}' was already read",
                    path,
                    document.name
                );
                outcome.skipped.push(path);
            }
            Ok((document, size)) => {
                outcome.bytes_read += size;
                names.insert(document.name.clone());
                outcome.documents.push(document);
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                outcome.skipped.push(path);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_txt_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "乙").unwrap();
        fs::write(temp.path().join("a.txt"), "甲").unwrap();
        fs::write(temp.path().join("notes.md"), "skip").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("c.txt"), "丙").unwrap();

        let names: Vec<String> = discover_documents(temp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_missing_dir_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(discover_documents(&temp.path().join("nope")).is_err());
    }

    #[test]
    fn test_gbk_fallback() {
        let (encoded, _, _) = encoding_rs::GBK.encode("海瑞罢官。");
        assert!(std::str::from_utf8(&encoded).is_err());

        let decoded = decode_bytes(&encoded, Path::new("海瑞.txt"));
        assert_eq!(decoded, "海瑞罢官。");
    }

    #[test]
    fn test_utf8_bom_dropped() {
        let bytes = "\u{feff}于谦".as_bytes();
        assert_eq!(decode_bytes(bytes, Path::new("于谦.txt")), "于谦");
    }

    #[test]
    fn test_unreadable_document_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(read_document(&temp.path().join("消失.txt")).is_err());
    }

    #[test]
    fn test_read_documents_uses_file_stem() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("戚继光.txt"), "戚继光抗倭。").unwrap();
        let (encoded, _, _) = encoding_rs::GBK.encode("海瑞罢官。");
        fs::write(temp.path().join("海瑞.txt"), &encoded).unwrap();

        let outcome = read_documents(temp.path()).unwrap();
        assert_eq!(outcome.documents.len(), 2);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.documents.iter().any(|d| d.name == "戚继光"));
        assert!(outcome
            .documents
            .iter()
            .any(|d| d.name == "海瑞" && d.text == "海瑞罢官。"));
    }

    #[test]
    fn test_duplicate_entry_name_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        fs::create_dir(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("a").join("张三.txt"), "张三任知县。").unwrap();
        fs::write(temp.path().join("b").join("张三.txt"), "张三任知府。").unwrap();
        fs::write(temp.path().join("李四.txt"), "李四戍边。").unwrap();

        let outcome = read_documents(temp.path()).unwrap();
        let names: Vec<&str> = outcome.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["张三", "李四"]);
        assert_eq!(outcome.documents[0].text, "张三任知县。");
        assert_eq!(outcome.skipped, vec![temp.path().join("b").join("张三.txt")]);
    }
}
