//! SQLite persistence for the embedding index.
//!
//! One file holds two parallel tables keyed by row position. Writes go to a
//! temporary file inside one transaction and are renamed into place, so a
//! reader never sees a half-written index.

use crate::index::EmbeddingIndex;
use crate::types::{Category, Chunk};
use mingyu_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE data (
    position INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    text TEXT NOT NULL
);

CREATE TABLE embeddings (
    position INTEGER PRIMARY KEY,
    vector BLOB NOT NULL
);
"#;

/// Write the index to `path`, replacing any previous file atomically.
pub fn save_index(path: &Path, index: &EmbeddingIndex) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("Failed to create index directory: {}", e))
        })?;
    }

    let tmp_path = temp_path(path);
    if tmp_path.exists() {
        std::fs::remove_file(&tmp_path)?;
    }

    {
        let mut conn = Connection::open(&tmp_path)
            .map_err(|e| AppError::Storage(format!("Failed to open {:?}: {}", tmp_path, e)))?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut insert_data = tx.prepare(
                "INSERT INTO data (position, id, name, category, text) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut insert_vector =
                tx.prepare("INSERT INTO embeddings (position, vector) VALUES (?1, ?2)")?;

            for (position, (chunk, vector)) in
                index.chunks().iter().zip(index.vectors()).enumerate()
            {
                let position = position as i64;
                insert_data.execute(params![
                    position,
                    chunk.id,
                    chunk.name,
                    chunk.category.as_str(),
                    chunk.text
                ])?;
                insert_vector.execute(params![position, embedding_to_bytes(vector)])?;
            }
        }
        tx.commit()?;
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        AppError::Storage(format!("Failed to move index into place at {:?}: {}", path, e))
    })?;

    tracing::info!("Saved index with {} chunks to {:?}", index.chunks().len(), path);
    Ok(())
}

/// Load an index written by [`save_index`].
///
/// Verifies that both tables have the same consecutive positions and that
/// every vector has the same dimension.
pub fn load_index(path: &Path) -> AppResult<EmbeddingIndex> {
    if !path.exists() {
        return Err(AppError::MissingIndex {
            path: path.to_path_buf(),
        });
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| AppError::Storage(format!("Failed to open index {:?}: {}", path, e)))?;

    let rows: Vec<(i64, String, String, String, String)> = {
        let mut stmt = conn
            .prepare("SELECT position, id, name, category, text FROM data ORDER BY position")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let blobs: Vec<(i64, Vec<u8>)> = {
        let mut stmt = conn.prepare("SELECT position, vector FROM embeddings ORDER BY position")?;
        let blobs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        blobs
    };

    if rows.len() != blobs.len() {
        return Err(AppError::Storage(format!(
            "Corrupt index {:?}: {} data rows but {} embedding rows",
            path,
            rows.len(),
            blobs.len()
        )));
    }

    let mut chunks = Vec::with_capacity(rows.len());
    for (expected, (position, id, name, category, text)) in rows.into_iter().enumerate() {
        check_position(path, "data", expected, position)?;
        let category = Category::parse(&category).ok_or_else(|| {
            AppError::Storage(format!("Unknown category '{}' for chunk {}", category, id))
        })?;
        chunks.push(Chunk {
            id,
            name,
            category,
            text,
        });
    }

    let mut vectors = Vec::with_capacity(blobs.len());
    for (expected, (position, bytes)) in blobs.into_iter().enumerate() {
        check_position(path, "embeddings", expected, position)?;
        vectors.push(bytes_to_embedding(&bytes)?);
    }

    let index = EmbeddingIndex::new(chunks, vectors)
        .map_err(|e| AppError::Storage(format!("Corrupt index {:?}: {}", path, e)))?;

    tracing::debug!("Loaded index with {} chunks from {:?}", index.chunks().len(), path);
    Ok(index)
}

fn check_position(path: &Path, table: &str, expected: usize, actual: i64) -> AppResult<()> {
    if actual != expected as i64 {
        return Err(AppError::Storage(format!(
            "Corrupt index {:?}: {} row {} has position {}",
            path, table, expected, actual
        )));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Storage(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::fixture;
    use crate::vector_index::VectorIndex;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bases/ming/index.sqlite");
        let index = fixture(&[
            ("张三_last", vec![0.6, 0.8]),
            ("李四_last", vec![1.0, 0.0]),
        ]);

        save_index(&path, &index).unwrap();
        let loaded = load_index(&path).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.fingerprint(), index.fingerprint());
        assert_eq!(
            loaded.search(&[1.0, 0.0], 2),
            index.search(&[1.0, 0.0], 2)
        );
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_overwrite_replaces_previous_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");

        save_index(&path, &fixture(&[("a", vec![1.0])])).unwrap();
        save_index(&path, &fixture(&[("b", vec![1.0]), ("c", vec![0.0])])).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.position_of("a"), None);
    }

    #[test]
    fn test_missing_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        match load_index(&path) {
            Err(AppError::MissingIndex { path: p }) => assert_eq!(p, path),
            other => panic!("expected MissingIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_tables_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        save_index(&path, &fixture(&[("a", vec![1.0]), ("b", vec![0.0])])).unwrap();

        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("DELETE FROM embeddings WHERE position = 1", [])
                .unwrap();
        }

        assert!(matches!(load_index(&path), Err(AppError::Storage(_))));
    }

    #[test]
    fn test_byte_conversion() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[0u8; 5]).is_err());
    }
}
