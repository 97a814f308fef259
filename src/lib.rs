//! # Web Image Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `config`: Parametri fissi della run e validazione
//! - `error`: Tipi di errore custom per le operazioni sui file
//! - `file_manager`: Discovery immagini, backup, utilità sulle dimensioni
//! - `image_processor`: Decodifica, conversione RGB, resize, codifica JPEG progressive
//! - `optimizer`: Orchestratore sequenziale del processo
//! - `progress`: Report su stdout, totali e progress bar
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use web_image_optimizer::{Config, ImageOptimizer};
//!
//! let optimizer = ImageOptimizer::new(Config::default())?;
//! let totals = optimizer.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod optimizer;
pub mod progress;

pub use config::Config;
pub use error::OptimizeError;
pub use image_processor::{ImageProcessor, TransformResult};
pub use optimizer::ImageOptimizer;
pub use progress::{Reporter, RunTotals};
