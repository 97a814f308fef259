//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery non ricorsiva delle immagini nella directory sorgente
//! - Filtro per estensione (case-insensitive) tramite allow-list
//! - Backup idempotente degli originali prima della trasformazione
//! - Utilità per dimensioni file e percentuali di riduzione
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati (default):
//! - **Immagini**: JPG, JPEG, PNG, WebP, BMP, TIFF
//!
//! ## Operazioni sui file:
//! - `find_candidates()`: Trova i file figli diretti della directory, ordinati per nome
//! - `ensure_backup_dir()`: Crea la directory dei backup (con i parent)
//! - `backup_original()`: Copia l'originale solo se il backup non esiste già
//! - `output_path_for()`: Calcola il path di output con l'estensione finale
//!
//! ## Utilità:
//! - `format_size()`: Converte bytes in formato leggibile (B, KB, MB, GB)
//! - `calculate_reduction()`: Calcola percentuale di riduzione
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_candidates(&config.source_dir, &config.extensions)?;
//! for file in files {
//!     FileManager::backup_original(&file, &config.backup_dir).await?;
//! }
//! ```

use crate::error::OptimizeError;
use anyhow::Result;
use std::fs::FileTimes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the size in bytes of a file
    pub async fn get_file_size(path: &Path) -> Result<u64, OptimizeError> {
        let metadata = fs::metadata(path).await?;
        Ok(metadata.len())
    }

    /// Find all candidate images that are direct children of `source_dir`.
    ///
    /// Subdirectories (including the backup directory) and their contents are
    /// never returned. The result is sorted by file name. A missing or
    /// unreadable source directory is an error.
    pub fn find_candidates(source_dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                anyhow::anyhow!("Failed to list source directory {}: {}", source_dir.display(), e)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if Self::is_supported_format(path, extensions) {
                files.push(path.to_path_buf());
            } else {
                debug!("Ignoring non-image file: {}", path.display());
            }
        }

        Ok(files)
    }

    /// Check if a file extension is in the allow-list (case-insensitive)
    pub fn is_supported_format(path: &Path, extensions: &[String]) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.iter().any(|allowed| *allowed == ext_lower)
        } else {
            false
        }
    }

    /// Create the backup directory, including missing parents
    pub async fn ensure_backup_dir(backup_dir: &Path) -> Result<()> {
        fs::create_dir_all(backup_dir).await.map_err(|e| {
            anyhow::anyhow!("Failed to create backup directory {}: {}", backup_dir.display(), e)
        })?;
        Ok(())
    }

    /// Copy `original` into `backup_dir` unless a backup with the same name exists.
    ///
    /// The copy keeps the original's access and modification times. Returns
    /// `true` when a new copy was written, `false` when an existing backup was
    /// left untouched.
    pub async fn backup_original(original: &Path, backup_dir: &Path) -> Result<bool, OptimizeError> {
        let file_name = original
            .file_name()
            .ok_or_else(|| OptimizeError::InvalidPath(original.display().to_string()))?;
        let backup_path = backup_dir.join(file_name);

        if fs::try_exists(&backup_path).await? {
            debug!("Backup already present, skipping: {}", backup_path.display());
            return Ok(false);
        }

        fs::copy(original, &backup_path).await?;

        let source_meta = fs::metadata(original).await?;
        let times = FileTimes::new()
            .set_accessed(source_meta.accessed()?)
            .set_modified(source_meta.modified()?);
        let backup = fs::OpenOptions::new().write(true).open(&backup_path).await?;
        backup.into_std().await.set_times(times)?;

        debug!("Backed up {} -> {}", original.display(), backup_path.display());
        Ok(true)
    }

    /// Path of the re-encoded file: same directory and stem, new extension
    pub fn output_path_for(input_path: &Path, output_extension: &str) -> PathBuf {
        input_path.with_extension(output_extension)
    }

    /// Get human-readable file size.
    ///
    /// Divides by 1024 per unit and keeps one decimal place. Negative sizes
    /// (growth after re-encoding) are always printed in bytes.
    pub fn format_size(size: i64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        format!("{:.1} {}", size, UNITS[unit_index])
    }

    /// Calculate percentage reduction (0 when the original is empty)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
