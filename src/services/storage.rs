// src/services/storage.rs

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::{field_error, AppError};

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Caminho relativo à raiz do armazenamento (é o que vai para o banco).
    pub path: String,
}

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn store(&self, folder: &str, original_filename: &str, bytes: &[u8]) -> Result<StoredFile, AppError>;

    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// Problema do arquivo como `(code, message_key)`, ou `None` se ele é aceito.
pub fn upload_problem(
    original_filename: &str,
    size: usize,
    allowed: &[&str],
    max_bytes: usize,
) -> Option<(&'static str, &'static str)> {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ext) if allowed.contains(&ext.as_str()) => {}
        _ => return Some(("file_type", "validation.file_type")),
    }
    if size == 0 || size > max_bytes {
        return Some(("file_too_large", "validation.file_too_large"));
    }
    None
}

/// Valida extensão e tamanho antes de qualquer escrita.
pub fn validate_upload(
    field: &'static str,
    original_filename: &str,
    size: usize,
    allowed: &[&str],
    max_bytes: usize,
) -> Result<(), AppError> {
    match upload_problem(original_filename, size, allowed, max_bytes) {
        Some((code, key)) => Err(field_error(field, code, key)),
        None => Ok(()),
    }
}

/// Grava todos ou nenhum: se um falhar, os já gravados são removidos.
pub async fn store_all<'a, I>(storage: &dyn DocumentStorage, folder: &str, files: I) -> Result<Vec<StoredFile>, AppError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut stored = Vec::new();
    for (original_filename, bytes) in files {
        match storage.store(folder, original_filename, bytes).await {
            Ok(file) => stored.push(file),
            Err(e) => {
                discard_all(storage, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Remoção best-effort (rollback): falhas só vão para o log.
pub async fn discard_all(storage: &dyn DocumentStorage, files: &[StoredFile]) {
    for file in files {
        if let Err(e) = storage.remove(&file.path).await {
            tracing::warn!(path = %file.path, "Falha ao remover arquivo órfão: {}", e);
        }
    }
}

// ---
// Disco local
// ---
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(relative);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(anyhow::anyhow!("Caminho inválido: {}", relative.display()).into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStorage for LocalDiskStorage {
    async fn store(&self, folder: &str, original_filename: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());

        let relative = format!("{}/{}.{}", folder, Uuid::new_v4(), extension);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Falha ao gravar {}", target.display()))?;

        Ok(StoredFile { path: relative })
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Falha ao remover {}", target.display()))
                .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::RecordingStorage;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("room-booking-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn upload_extension_is_checked_case_insensitively() {
        assert!(validate_upload("permit_letter", "Surat.PDF", 10, DOCUMENT_EXTENSIONS, 100).is_ok());
        assert_eq!(upload_problem("foto.webp", 10, DOCUMENT_EXTENSIONS, 100), Some(("file_type", "validation.file_type")));
        assert!(validate_upload("permit_letter", "script.exe", 10, DOCUMENT_EXTENSIONS, 100).is_err());
        assert!(validate_upload("permit_letter", "no_extension", 10, DOCUMENT_EXTENSIONS, 100).is_err());
    }

    #[test]
    fn upload_size_is_bounded() {
        assert!(validate_upload("proposal", "p.pdf", 0, DOCUMENT_EXTENSIONS, 100).is_err());
        assert!(validate_upload("proposal", "p.pdf", 101, DOCUMENT_EXTENSIONS, 100).is_err());
        assert!(validate_upload("proposal", "p.pdf", 100, DOCUMENT_EXTENSIONS, 100).is_ok());
    }

    #[tokio::test]
    async fn store_then_remove_round_trip() {
        let root = temp_root();
        let storage = LocalDiskStorage::new(&root);

        let stored = storage.store("bookings", "surat.pdf", b"%PDF-1.4").await.unwrap();
        assert!(stored.path.starts_with("bookings/"));
        assert!(stored.path.ends_with(".pdf"));
        assert_eq!(tokio::fs::read(root.join(&stored.path)).await.unwrap(), b"%PDF-1.4");

        storage.remove(&stored.path).await.unwrap();
        assert!(!root.join(&stored.path).exists());

        // Remover de novo não é erro
        storage.remove(&stored.path).await.unwrap();
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let storage = LocalDiskStorage::new(temp_root());
        assert!(storage.remove("../etc/passwd").await.is_err());
        assert!(storage.remove("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn store_all_removes_earlier_files_when_one_fails() {
        let storage = RecordingStorage::failing_on(3);
        let files: [(&str, &[u8]); 3] = [("surat.pdf", b"a"), ("proposal.docx", b"b"), ("hadir.pdf", b"c")];

        let result = store_all(&storage, "bookings", files).await;

        assert!(result.is_err());
        assert_eq!(storage.stored().len(), 2);
        assert_eq!(storage.removed(), storage.stored());
    }

    #[tokio::test]
    async fn store_all_keeps_everything_on_success() {
        let storage = RecordingStorage::default();
        let files: [(&str, &[u8]); 2] = [("surat.pdf", b"a"), ("proposal.docx", b"b")];

        let stored = store_all(&storage, "bookings", files).await.unwrap();

        assert_eq!(stored.len(), 2);
        assert!(storage.removed().is_empty());
    }

    #[tokio::test]
    async fn discard_all_tolerates_missing_files() {
        let storage = LocalDiskStorage::new(temp_root());
        let files = vec![StoredFile { path: "bookings/nao-existe.pdf".into() }];
        discard_all(&storage, &files).await;
    }
}
