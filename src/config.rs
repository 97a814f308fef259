//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri prima dell'avvio
//! - Fornisce i valori fissi usati dal binario (nessun flag, nessuna variabile d'ambiente)
//!
//! ## Parametri di configurazione:
//! - `source_dir`: Directory delle immagini (default: `assets/img/renders`)
//! - `backup_dir`: Directory dei backup (default: `assets/img/renders/originals`)
//! - `max_width`: Larghezza massima in pixel (default: 1920)
//! - `jpeg_quality`: Qualità JPEG (1-100, default: 82)
//! - `extensions`: Estensioni accettate (jpg, jpeg, png, webp, bmp, tiff)
//! - `output_extension`: Estensione dei file generati (default: `jpeg`)
//! - `progressive`: Codifica JPEG progressive con tabelle Huffman ottimizzate (default: true)
//!
//! ## Validazione:
//! - Controlla che jpeg_quality sia 1-100
//! - Controlla che max_width sia > 0
//! - Controlla che la allow-list non sia vuota
//! - Controlla che backup_dir sia diversa da source_dir
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config::for_directory("/tmp/renders");
//! config.validate()?;
//! ```

use crate::error::OptimizeError;
use std::path::{Path, PathBuf};

/// Default source directory, relative to the working directory
pub const DEFAULT_SOURCE_DIR: &str = "assets/img/renders";
/// Name of the backup subdirectory inside the source directory
pub const BACKUP_DIR_NAME: &str = "originals";
/// Images wider than this are scaled down
pub const MAX_WIDTH: u32 = 1920;
/// JPEG quality on the 0-100 scale
pub const JPEG_QUALITY: u8 = 82;
/// Extension given to every output file
pub const OUTPUT_EXTENSION: &str = "jpeg";
/// Accepted input extensions (compared lowercased)
pub const VALID_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff"];

/// Configuration for a batch optimization run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory scanned for candidate images (direct children only)
    pub source_dir: PathBuf,
    /// Directory holding untouched copies of the originals
    pub backup_dir: PathBuf,
    /// Maximum output width in pixels
    pub max_width: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Lowercase extensions eligible for processing
    pub extensions: Vec<String>,
    /// Extension of the re-encoded files
    pub output_extension: String,
    /// Encode progressive scans with optimized Huffman tables
    pub progressive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_directory(DEFAULT_SOURCE_DIR)
    }
}

impl Config {
    /// Build the fixed configuration for an arbitrary source directory.
    ///
    /// The backup directory is always `<source_dir>/originals`.
    pub fn for_directory(source_dir: impl AsRef<Path>) -> Self {
        let source_dir = source_dir.as_ref().to_path_buf();
        Self {
            backup_dir: source_dir.join(BACKUP_DIR_NAME),
            source_dir,
            max_width: MAX_WIDTH,
            jpeg_quality: JPEG_QUALITY,
            extensions: VALID_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            output_extension: OUTPUT_EXTENSION.to_string(),
            progressive: true,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(OptimizeError::Validation(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.max_width == 0 {
            return Err(OptimizeError::Validation(
                "Maximum width must be greater than 0".to_string(),
            ));
        }

        if self.extensions.is_empty() {
            return Err(OptimizeError::Validation(
                "At least one input extension is required".to_string(),
            ));
        }

        if self.output_extension.is_empty() {
            return Err(OptimizeError::Validation(
                "Output extension must not be empty".to_string(),
            ));
        }

        if self.backup_dir == self.source_dir {
            return Err(OptimizeError::Validation(format!(
                "Backup directory must differ from source directory: {}",
                self.source_dir.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.source_dir, PathBuf::from("assets/img/renders"));
        assert_eq!(config.backup_dir, PathBuf::from("assets/img/renders/originals"));
        assert_eq!(config.max_width, 1920);
        assert_eq!(config.jpeg_quality, 82);
        assert_eq!(config.output_extension, "jpeg");
        assert_eq!(config.extensions, vec!["jpg", "jpeg", "png", "webp", "bmp", "tiff"]);
        assert!(config.progressive);
    }

    #[test]
    fn test_config_for_directory() {
        let config = Config::for_directory("/tmp/renders");
        assert_eq!(config.source_dir, PathBuf::from("/tmp/renders"));
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/renders/originals"));
        assert_eq!(config.max_width, Config::default().max_width);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_quality = 101;
        assert!(config.validate().is_err());

        config.jpeg_quality = 82;
        config.max_width = 0;
        assert!(config.validate().is_err());

        config.max_width = 1920;
        config.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backup_dir = config.source_dir.clone();
        assert!(matches!(config.validate(), Err(OptimizeError::Validation(_))));
    }
}
