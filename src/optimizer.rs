//! # Main Optimizer Orchestrator Module
//!
//! Questo è il modulo principale che orchestra tutto il processo di ottimizzazione.
//!
//! ## Responsabilità:
//! - Validazione della configurazione prima dell'avvio
//! - Creazione della directory dei backup (sempre, anche senza immagini)
//! - Discovery delle immagini nella directory sorgente
//! - Backup e trasformazione sequenziale, un file alla volta
//! - Raccolta statistiche e report finale
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: Verifica config, crea l'`ImageProcessor`
//! 2. **Backup dir**: `create_dir_all` della directory dei backup
//! 3. **File discovery**: Trova i file candidati (errore fatale se la directory manca)
//! 4. **Processing sequenziale**: backup → trasformazione → report per ogni file
//! 5. **Statistics**: Somma prima/dopo solo per i file riusciti
//! 6. **Reporting**: Totali finali e posizione dei backup
//!
//! ## Error handling:
//! - Errori per singoli file (backup o trasformazione) non bloccano la run:
//!   il file viene saltato, l'errore stampato con prefisso `ERROR:`
//! - Un file il cui backup fallisce non viene trasformato
//! - Config non valida, directory sorgente mancante e directory dei backup
//!   non creabile terminano la run
//!
//! ## Esempio:
//! ```rust,ignore
//! let optimizer = ImageOptimizer::new(Config::default())?;
//! let totals = optimizer.run().await?;
//! ```

use crate::{
    config::Config,
    file_manager::FileManager,
    image_processor::ImageProcessor,
    progress::{ProgressManager, Reporter, RunTotals},
};
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Sequential batch orchestrator
pub struct ImageOptimizer {
    config: Config,
    processor: ImageProcessor,
}

impl ImageOptimizer {
    /// Create a new optimizer, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let processor = ImageProcessor::new(config.clone());

        Ok(Self { config, processor })
    }

    /// Run the batch, reporting to stdout
    pub async fn run(&self) -> Result<RunTotals> {
        let mut reporter = Reporter::stdout();
        self.run_with_reporter(&mut reporter).await
    }

    /// Run the batch, reporting through `reporter`.
    ///
    /// Returns the totals of the files that were transformed successfully.
    pub async fn run_with_reporter<W: Write>(&self, reporter: &mut Reporter<W>) -> Result<RunTotals> {
        let source_dir = &self.config.source_dir;
        let backup_dir = &self.config.backup_dir;

        reporter.header()?;
        info!("Starting image optimization in: {}", source_dir.display());
        debug!(
            "Max width: {}px, JPEG quality: {}, output extension: .{}",
            self.config.max_width, self.config.jpeg_quality, self.config.output_extension
        );

        FileManager::ensure_backup_dir(backup_dir).await?;

        let files = FileManager::find_candidates(source_dir, &self.config.extensions)?;
        let mut totals = RunTotals::new();

        if files.is_empty() {
            info!("No images found to process");
            reporter.no_images(source_dir)?;
            return Ok(totals);
        }

        info!("Found {} images to process", files.len());

        let progress = ProgressManager::new(files.len() as u64);

        for file_path in &files {
            let name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_path.display().to_string());
            progress.set_message(&name);
            progress.suspend(|| reporter.file_heading(&name))?;

            self.process_file(file_path, reporter, &progress, &mut totals).await?;
            progress.inc();
        }

        progress.finish();

        info!(
            "Finished: {} processed, {} errors, {} -> {} bytes",
            totals.files_processed, totals.errors, totals.total_before, totals.total_after
        );
        reporter.summary(&totals, backup_dir)?;

        Ok(totals)
    }

    /// Backup then transform one file; per-file failures are reported, not returned.
    ///
    /// The only errors propagated are failures to write the report itself.
    async fn process_file<W: Write>(
        &self,
        file_path: &Path,
        reporter: &mut Reporter<W>,
        progress: &ProgressManager,
        totals: &mut RunTotals,
    ) -> Result<()> {
        match FileManager::backup_original(file_path, &self.config.backup_dir).await {
            Ok(true) => progress.suspend(|| reporter.backup_created())?,
            Ok(false) => {}
            Err(e) => {
                error!("Backup failed for {}: {}", file_path.display(), e);
                totals.add_error();
                let message = format!("Backup fallido: {}", e);
                progress.suspend(|| reporter.file_error(&message))?;
                return Ok(());
            }
        }

        match self.processor.transform(file_path).await {
            Ok(result) => {
                totals.add(&result);
                progress.suspend(|| reporter.file_result(&result))?;
            }
            Err(e) => {
                error!("Failed to process {}: {}", file_path.display(), e);
                totals.add_error();
                progress.suspend(|| reporter.file_error(&e))?;
            }
        }

        Ok(())
    }
}
