use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

fn is_in_memory(db_url: &str) -> bool {
    db_url == "sqlite::memory:" || db_url.contains("mode=memory")
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_in_memory(trimmed) || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directory so the pool can open it.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        let shared = "sqlite:file:memdb?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared), shared);
        assert!(prepare_sqlite_file(shared).is_ok());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/tutor.sqlite3");
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("data/tutor.sqlite3"));
        assert!(Path::new(url.trim_start_matches("sqlite://")).is_absolute());
    }

    #[test]
    fn creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tutor.sqlite3");
        let url = normalize_sqlite_url(&path.display().to_string());
        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_non_sqlite_urls() {
        assert!(prepare_sqlite_file("postgres://localhost/tutor").is_err());
    }
}
