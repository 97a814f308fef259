//! # Web Image Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing della command line con `clap` (solo `--help` e `--version`)
//! - Inizializzazione del sistema di logging con `tracing` su stderr
//! - Creazione della configurazione fissa e avvio dell'optimizer
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (nessuna opzione di pipeline)
//! 2. Configura il logging (livello `warn`, `RUST_LOG` per diagnostica)
//! 3. Crea `Config::default()` (`assets/img/renders`, 1920px, qualità 82)
//! 4. Istanzia `ImageOptimizer` e avvia il processo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer
//! RUST_LOG=debug image-optimizer
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use web_image_optimizer::{Config, ImageOptimizer};

#[derive(Parser)]
#[command(name = "image-optimizer", version)]
#[command(about = "Resize and re-encode the images in assets/img/renders as JPEG for the web")]
struct Args {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let optimizer = ImageOptimizer::new(Config::default())?;
    optimizer.run().await?;

    Ok(())
}
