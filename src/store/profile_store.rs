use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::ColumnMapping;
use crate::models::Profile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("profile table not found: {path}")]
    SourceNotFound { path: PathBuf },
    #[error("cannot read profile table {path}: {source}")]
    SourceUnreadable { path: PathBuf, source: io::Error },
    #[error("malformed profile table {path}: {message}")]
    SourceParse { path: PathBuf, message: String },
}

struct CacheEntry {
    modified: Option<SystemTime>,
    profiles: Arc<Vec<Profile>>,
}

/// Loads and caches the profile table. The table is read once and the result
/// reused for every request until the file's modification time changes, at
/// which point the next load re-reads it.
#[derive(Clone)]
pub struct ProfileStore {
    source_path: PathBuf,
    columns: ColumnMapping,
    cache: Arc<RwLock<Option<CacheEntry>>>,
}

impl ProfileStore {
    pub fn new(source_path: PathBuf, columns: ColumnMapping) -> Self {
        ProfileStore {
            source_path,
            columns,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn load(&self) -> Result<Arc<Vec<Profile>>, StoreError> {
        let modified = source_modified(&self.source_path)?;

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if cache_is_fresh(entry.modified, modified) {
                    return Ok(entry.profiles.clone());
                }
            }
        }

        let profiles = Arc::new(read_profiles(&self.source_path, &self.columns)?);
        info!(
            "Loaded {} profiles from {}",
            profiles.len(),
            self.source_path.display()
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            modified,
            profiles: profiles.clone(),
        });
        Ok(profiles)
    }
}

// An unknown mtime never counts as fresh, so filesystems that report none
// re-read on every load instead of serving a stale table.
fn cache_is_fresh(cached: Option<SystemTime>, current: Option<SystemTime>) -> bool {
    cached.is_some() && cached == current
}

fn source_modified(path: &Path) -> Result<Option<SystemTime>, StoreError> {
    match std::fs::metadata(path) {
        // Filesystems without mtime support fall back to always re-reading.
        Ok(meta) => Ok(meta.modified().ok()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::SourceNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(StoreError::SourceUnreadable {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn read_profiles(path: &Path, columns: &ColumnMapping) -> Result<Vec<Profile>, StoreError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StoreError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => StoreError::SourceUnreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| parse_error(path, e.to_string()))?
        .clone();
    let name_idx = mapped_column(path, &headers, &columns.name)?;
    let image_idx = mapped_column(path, &headers, &columns.image)?;
    let link_idx = mapped_column(path, &headers, &columns.link)?;

    let mut profiles = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_error(path, e.to_string()))?;
        // Header is line 1, first record line 2.
        let line = row + 2;
        profiles.push(Profile {
            name: required_field(path, &record, name_idx, &columns.name, line)?,
            image_ref: required_field(path, &record, image_idx, &columns.image, line)?,
            link: required_field(path, &record, link_idx, &columns.link, line)?,
        });
    }
    Ok(profiles)
}

fn mapped_column(
    path: &Path,
    headers: &csv::StringRecord,
    wanted: &str,
) -> Result<usize, StoreError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| parse_error(path, format!("missing column '{}'", wanted)))
}

fn required_field(
    path: &Path,
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> Result<String, StoreError> {
    let value = record.get(index).unwrap_or("").trim();
    if value.is_empty() {
        return Err(parse_error(
            path,
            format!("line {}: empty value in column '{}'", line, column),
        ));
    }
    Ok(value.to_string())
}

fn parse_error(path: &Path, message: String) -> StoreError {
    StoreError::SourceParse {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            name: "name".to_string(),
            image: "image".to_string(),
            link: "link".to_string(),
        }
    }

    fn write_source(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("profiles.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_profiles_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "name,image,link\n\
             Acme,acme,https://example.com/acme\n\
             Bolt,bolt,https://example.com/bolt\n",
        );

        let store = ProfileStore::new(path, mapping());
        let profiles = store.load().await.unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Acme");
        assert_eq!(profiles[0].image_ref, "acme");
        assert_eq!(profiles[1].link, "https://example.com/bolt");
    }

    #[tokio::test]
    async fn second_load_returns_cached_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,image,link\nAcme,acme,https://example.com\n");

        let store = ProfileStore::new(path, mapping());
        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn unknown_mtime_is_never_fresh() {
        // Without a comparable mtime the cache must not be trusted, or a
        // filesystem that reports none would serve the first read forever.
        assert!(!cache_is_fresh(None, None));

        let now = SystemTime::now();
        assert!(cache_is_fresh(Some(now), Some(now)));
        assert!(!cache_is_fresh(
            Some(now),
            Some(now + std::time::Duration::from_secs(1))
        ));
        assert!(!cache_is_fresh(Some(now), None));
        assert!(!cache_is_fresh(None, Some(now)));
    }

    #[tokio::test]
    async fn changed_mtime_invalidates_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,image,link\nAcme,acme,https://example.com\n");

        let store = ProfileStore::new(path.clone(), mapping());
        let first = store.load().await.unwrap();
        assert_eq!(first.len(), 1);

        let mut file = File::create(&path).unwrap();
        file.write_all(
            b"name,image,link\n\
              Acme,acme,https://example.com\n\
              Bolt,bolt,https://example.com/bolt\n",
        )
        .unwrap();
        // Force the mtime forward so the rewrite is visible even on coarse
        // timestamp filesystems.
        file.set_modified(SystemTime::now() + std::time::Duration::from_secs(5))
            .unwrap();
        drop(file);

        let second = store.load().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].name, "Bolt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_file_is_distinct_from_missing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,image,link\nAcme,acme,https://example.com\n");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to verify in that case.
        if File::open(&path).is_ok() {
            return;
        }

        let store = ProfileStore::new(path, mapping());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::SourceUnreadable { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("absent.csv"), mapping());

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_mapped_column_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,link\nAcme,https://example.com\n");

        let store = ProfileStore::new(path, mapping());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::SourceParse { .. }));
        assert!(err.to_string().contains("image"));
    }

    #[tokio::test]
    async fn uneven_row_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,image,link\nAcme,acme\n");

        let store = ProfileStore::new(path, mapping());
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::SourceParse { .. }));
    }

    #[tokio::test]
    async fn empty_required_field_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "name,image,link\n,acme,https://example.com\n");

        let store = ProfileStore::new(path, mapping());
        let err = store.load().await.unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn column_mapping_matches_headers_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "Nome,Instagram,Url\nAcme,acme_oficial,https://example.com\n",
        );

        let store = ProfileStore::new(
            path,
            ColumnMapping {
                name: "nome".to_string(),
                image: "instagram".to_string(),
                link: "url".to_string(),
            },
        );
        let profiles = store.load().await.unwrap();
        assert_eq!(profiles[0].image_ref, "acme_oficial");
    }

    #[tokio::test]
    async fn duplicate_names_are_kept_as_separate_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "name,image,link\n\
             Acme,acme,https://example.com/a\n\
             Acme,acme2,https://example.com/b\n",
        );

        let store = ProfileStore::new(path, mapping());
        let profiles = store.load().await.unwrap();
        assert_eq!(profiles.len(), 2);
    }
}
