// Local filesystem adapter - File system operations on the host

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::ports::*;

/// Local filesystem adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn fs_error(action: &str, path: &Path, err: std::io::Error) -> DomainError {
    DomainError::FsFail(format!("Failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
        tokio::fs::try_exists(file_path)
            .await
            .map_err(|e| fs_error("check", file_path, e))
    }

    async fn create_directory(&self, dir_path: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(dir_path)
            .await
            .map_err(|e| fs_error("create directory", dir_path, e))
    }

    async fn list_files(&self, dir_path: &Path) -> Result<Vec<FileEntry>, DomainError> {
        let mut entries = match tokio::fs::read_dir(dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(fs_error("list", dir_path, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| fs_error("list", dir_path, e))?
        {
            // Entries can vanish between listing and stat
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if metadata.is_file() {
                files.push(FileEntry {
                    path: entry.path(),
                    size: metadata.len(),
                    modified: metadata.modified().ok(),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError> {
        tokio::fs::remove_file(file_path)
            .await
            .map_err(|e| fs_error("delete", file_path, e))
    }

    async fn directory_size(&self, dir_path: &Path) -> Result<u64, DomainError> {
        let root: PathBuf = dir_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| entry.metadata().ok())
                .map(|metadata| metadata.len())
                .sum::<u64>()
        })
        .await
        .map_err(|e| DomainError::ProcessingError(format!("Size scan failed: {}", e)))
    }

    async fn create_temp_file(
        &self,
        dir_path: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<tempfile::TempPath, DomainError> {
        self.create_directory(dir_path).await?;
        let temp_file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir_path)
            .map_err(|e| DomainError::FsFail(format!("Failed to create temp file: {}", e)))?;
        Ok(temp_file.into_temp_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"12345").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"1").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.mp4"), b"123").unwrap();

        let fs = FsLocalAdapter::new();
        let files = fs.list_files(dir.path()).await.unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4"]);
        assert_eq!(files[1].size, 5);
        assert!(files[0].modified.is_some());
    }

    #[tokio::test]
    async fn test_missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FsLocalAdapter::new();
        assert!(fs
            .list_files(&dir.path().join("absent"))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(fs.directory_size(&dir.path().join("absent")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_directory_size_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b"), vec![0u8; 50]).unwrap();

        let fs = FsLocalAdapter::new();
        assert_eq!(fs.directory_size(dir.path()).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn test_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let fs = FsLocalAdapter::new();
        let scratch = dir.path().join("scratch");

        let temp = fs.create_temp_file(&scratch, "seg_", ".mp4").await.unwrap();
        let path = temp.to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(".mp4"));

        drop(temp);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.mp4");
        std::fs::write(&file, b"x").unwrap();

        let fs = FsLocalAdapter::new();
        assert!(fs.file_exists(&file).await.unwrap());
        fs.delete_file(&file).await.unwrap();
        assert!(!fs.file_exists(&file).await.unwrap());
        assert!(fs.delete_file(&file).await.is_err());
    }
}
