//! # Progress Tracking and Reporting Module
//!
//! Questo modulo gestisce il report su stdout, le statistiche della run e la
//! progress bar.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` su stderr (nascosta se non è un terminale)
//! - Report leggibile per ogni file: dimensioni prima/dopo, risparmio, output
//! - Tracking dei totali della run (solo file elaborati con successo)
//! - Riepilogo finale con totali e directory dei backup
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar
//! - `RunTotals`: Traccia statistiche cumulative
//! - `Reporter`: Scrive il report testuale su qualsiasi `Write`
//!
//! ## Esempio di report:
//! ```text
//! [photo.png]
//!   Backup: OK
//!   Redimensionado: 3000x2000 -> 1920x1280
//!   Antes  : 5.0 MB
//!   Despues: 412.3 KB
//!   Ahorro : 4.6 MB (92%)
//!   Output : photo.jpeg
//! ```

use crate::file_manager::FileManager;
use crate::image_processor::TransformResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

const RULE_WIDTH: usize = 55;

/// Manages progress reporting for the batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set a custom message without incrementing
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Advance by one file
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Hide the bar while `f` writes to the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    /// Remove the bar once the batch is done
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Statistics tracker for a run.
///
/// Only files whose transform succeeded contribute sizes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunTotals {
    pub files_processed: usize,
    pub errors: usize,
    pub total_before: u64,
    pub total_after: u64,
}

impl RunTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: &TransformResult) {
        self.files_processed += 1;
        self.total_before += result.before;
        self.total_after += result.after;
    }

    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    pub fn total_saved(&self) -> i64 {
        self.total_before as i64 - self.total_after as i64
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_before, self.total_after)
    }
}

/// Writes the human-readable report
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "  Optimizador de Imagenes para Web")?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out)
    }

    pub fn no_images(&mut self, source_dir: &Path) -> io::Result<()> {
        writeln!(self.out, "No se encontraron imagenes en: {}", source_dir.display())
    }

    pub fn file_heading(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "[{}]", name)
    }

    pub fn backup_created(&mut self) -> io::Result<()> {
        writeln!(self.out, "  Backup: OK")
    }

    pub fn file_result(&mut self, result: &TransformResult) -> io::Result<()> {
        if let Some(resize) = &result.resized {
            writeln!(self.out, "  Redimensionado: {}", resize)?;
        }
        writeln!(self.out, "  Antes  : {}", FileManager::format_size(result.before as i64))?;
        writeln!(self.out, "  Despues: {}", FileManager::format_size(result.after as i64))?;
        writeln!(
            self.out,
            "  Ahorro : {} ({:.0}%)",
            FileManager::format_size(result.saved),
            result.pct
        )?;
        writeln!(self.out, "  Output : {}", result.output)
    }

    pub fn file_error(&mut self, error: &dyn Display) -> io::Result<()> {
        writeln!(self.out, "  ERROR: {}", error)
    }

    pub fn summary(&mut self, totals: &RunTotals, backup_dir: &Path) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            self.out,
            "  TOTAL ANTES  : {}",
            FileManager::format_size(totals.total_before as i64)
        )?;
        writeln!(
            self.out,
            "  TOTAL DESPUES: {}",
            FileManager::format_size(totals.total_after as i64)
        )?;
        writeln!(
            self.out,
            "  AHORRO TOTAL : {} ({:.0}%)",
            FileManager::format_size(totals.total_saved()),
            totals.overall_reduction_percent()
        )?;
        writeln!(self.out, "  Originales   : {}/", backup_dir.display())?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
