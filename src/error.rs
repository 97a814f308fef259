//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare gli errori per-file
//! - Fornisce messaggi di errore descrittivi (stampati dopo `ERROR:` nel report)
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, disco pieno)
//! - `Image`: Errori di decodifica immagini (file corrotti, etc.)
//! - `Encode`: Errori dell'encoder JPEG
//! - `DimensionsTooLarge`: Immagine oltre il limite JPEG di 65535 pixel per lato
//! - `InvalidPath`: Path senza nome file o con caratteri non validi
//! - `Task`: Task bloccante terminato in modo anomalo
//! - `Validation`: Errori di validazione configurazione
//!
//! ## Esempio:
//! ```rust,ignore
//! let file_name = path
//!     .file_name()
//!     .ok_or_else(|| OptimizeError::InvalidPath(path.display().to_string()))?;
//! ```

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    Encode(#[from] jpeg_encoder::EncodingError),

    #[error("Image too large for JPEG: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl From<tempfile::PersistError> for OptimizeError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
