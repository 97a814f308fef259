//! # Image Processing Module
//!
//! Questo modulo applica la trasformazione completa a una singola immagine
//! usando la libreria `image` in-process.
//!
//! ## Pipeline di Trasformazione
//!
//! 1. **Dimensione originale**: Legge la dimensione in byte del file sorgente
//! 2. **Decodifica**: Formato rilevato dal contenuto, fallback sull'estensione
//! 3. **Normalizzazione colore**: RGBA, palette, scala di grigi, 16 bit e float
//!    diventano RGB 8 bit senza canale alpha
//! 4. **Resize condizionale**: Solo se la larghezza supera `max_width`;
//!    altezza = `floor(h * max_width / w)`, filtro Lanczos3, mai upscaling
//! 5. **Codifica JPEG**: Qualità fissa, scansione progressive e tabelle
//!    Huffman ottimizzate (`jpeg-encoder`), file temporaneo nella stessa directory
//! 6. **Sostituzione**: Il temporaneo viene rinominato sul path `.jpeg` e
//!    riceve i permessi del file sorgente; l'originale viene eliminato se
//!    aveva un'estensione diversa
//! 7. **Statistiche**: Dimensione finale, byte risparmiati, percentuale
//!
//! ## Gestione Path Output
//!
//! ```text
//! Input:  renders/photo.png
//! Output: renders/photo.jpeg   (photo.png eliminato)
//!
//! Input:  renders/photo.jpeg
//! Output: renders/photo.jpeg   (sovrascritto)
//! ```
//!
//! ## Error Handling
//!
//! Ogni errore viene restituito come `OptimizeError` all'orchestratore, che
//! lo riporta e passa al file successivo. Se la codifica fallisce, il file
//! temporaneo viene rimosso e l'originale resta intatto.
//!
//! ## Esempio
//!
//! ```rust,ignore
//! let processor = ImageProcessor::new(Config::default());
//! let result = processor.transform(Path::new("assets/img/renders/photo.png")).await?;
//! println!("{} -> {} ({:.0}%)", result.original, result.output, result.pct);
//! ```

use crate::config::Config;
use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use jpeg_encoder::{ColorType as JpegColorType, Encoder};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const TEMP_PREFIX: &str = ".optimizing-";

/// Dimension change applied to an image wider than the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} -> {}x{}",
            self.original_width, self.original_height, self.width, self.height
        )
    }
}

/// Outcome of transforming one file
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// File name of the source image
    pub original: String,
    /// File name of the written JPEG
    pub output: String,
    /// Size of the source in bytes
    pub before: u64,
    /// Size of the output in bytes
    pub after: u64,
    /// `before - after`; negative when re-encoding grew the file
    pub saved: i64,
    /// `saved / before * 100`, or 0 for an empty source
    pub pct: f64,
    /// Present when the image was scaled down
    pub resized: Option<Resize>,
}

impl TransformResult {
    pub fn new(
        original: String,
        output: String,
        before: u64,
        after: u64,
        resized: Option<Resize>,
    ) -> Self {
        Self {
            original,
            output,
            before,
            after,
            saved: before as i64 - after as i64,
            pct: FileManager::calculate_reduction(before, after),
            resized,
        }
    }
}

/// Dimensions after enforcing `max_width`, or `None` when no resize is needed.
///
/// The height is truncated (integer division), never rounded, and is kept at
/// least one pixel.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> Option<(u32, u32)> {
    if width <= max_width {
        return None;
    }
    let new_height = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
    Some((max_width, new_height as u32))
}

/// Convert any decoded representation to 8-bit RGB without alpha
pub fn normalize_color(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            debug!("Converting {:?} to RGB8", other.color());
            other.to_rgb8()
        }
    }
}

/// Applies decode → normalize → resize → encode → replace to single files
pub struct ImageProcessor {
    config: Config,
}

impl ImageProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Transform one candidate file in place.
    ///
    /// On success the output `<stem>.<output_extension>` exists and, when it
    /// differs from `input_path`, the input has been removed.
    pub async fn transform(&self, input_path: &Path) -> Result<TransformResult, OptimizeError> {
        let original = file_name_of(input_path)?;
        let dir = input_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| OptimizeError::InvalidPath(input_path.display().to_string()))?;
        let output_path = FileManager::output_path_for(input_path, &self.config.output_extension);
        let output = file_name_of(&output_path)?;

        let input_meta = tokio::fs::metadata(input_path).await?;
        let before = input_meta.len();

        let input = input_path.to_path_buf();
        let max_width = self.config.max_width;
        let quality = self.config.jpeg_quality;
        let progressive = self.config.progressive;
        let (encoded, resized) = tokio::task::spawn_blocking(move || {
            encode_to_temp(&input, &dir, max_width, quality, progressive)
        })
        .await??;

        if let Some(resize) = &resized {
            info!("Resized {}: {}", original, resize);
        }

        // Temp files are created owner-only
        encoded.persist(&output_path)?;
        tokio::fs::set_permissions(&output_path, input_meta.permissions()).await?;

        if output_path != input_path && tokio::fs::try_exists(input_path).await? {
            tokio::fs::remove_file(input_path).await?;
            debug!("Removed replaced original: {}", input_path.display());
        }

        let after = FileManager::get_file_size(&output_path).await?;
        let result = TransformResult::new(original, output, before, after, resized);

        info!(
            "Optimized {} -> {}: {} -> {} bytes ({:.1}%)",
            result.original, result.output, result.before, result.after, result.pct
        );

        Ok(result)
    }
}

fn file_name_of(path: &Path) -> Result<String, OptimizeError> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| OptimizeError::InvalidPath(path.display().to_string()))
}

/// CPU-bound half of the transform, run on the blocking pool
fn encode_to_temp(
    input: &Path,
    dir: &Path,
    max_width: u32,
    quality: u8,
    progressive: bool,
) -> Result<(NamedTempFile, Option<Resize>), OptimizeError> {
    let decoded = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    let (width, height) = (decoded.width(), decoded.height());

    let mut rgb = normalize_color(decoded);

    let resized = match target_dimensions(width, height, max_width) {
        Some((new_width, new_height)) => {
            rgb = image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3);
            Some(Resize {
                original_width: width,
                original_height: height,
                width: new_width,
                height: new_height,
            })
        }
        None => None,
    };

    let (width, height) = match (u16::try_from(rgb.width()), u16::try_from(rgb.height())) {
        (Ok(width), Ok(height)) => (width, height),
        _ => {
            return Err(OptimizeError::DimensionsTooLarge {
                width: rgb.width(),
                height: rgb.height(),
            })
        }
    };

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".jpeg")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let mut encoder = Encoder::new(&mut writer, quality);
        encoder.set_progressive(progressive);
        encoder.set_optimized_huffman_tables(true);
        encoder.encode(rgb.as_raw(), width, height, JpegColorType::Rgb)?;
        writer.flush()?;
    }

    Ok((temp, resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayAlphaImage, GrayImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn gradient_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    fn processor_for(dir: &Path) -> ImageProcessor {
        ImageProcessor::new(Config::for_directory(dir))
    }

    /// Start-of-frame marker byte of a JPEG stream (0xC0 baseline, 0xC2 progressive)
    fn frame_marker(bytes: &[u8]) -> Option<u8> {
        let mut pos = 2;
        while pos + 4 <= bytes.len() && bytes[pos] == 0xFF {
            let marker = bytes[pos + 1];
            if (0xC0..=0xCF).contains(&marker) && ![0xC4, 0xC8, 0xCC].contains(&marker) {
                return Some(marker);
            }
            let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            pos += 2 + len;
        }
        None
    }

    fn only_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(3000, 2000, 1920), Some((1920, 1280)));
        assert_eq!(target_dimensions(1920, 1080, 1920), None);
        assert_eq!(target_dimensions(800, 6000, 1920), None);
        // 1000 * 1920 / 1921 = 999.47..., truncated
        assert_eq!(target_dimensions(1921, 1000, 1920), Some((1920, 999)));
        assert_eq!(target_dimensions(4000, 3001, 1920), Some((1920, 1440)));
        assert_eq!(target_dimensions(5000, 1, 1920), Some((1920, 1)));
    }

    #[test]
    fn test_resize_display() {
        let resize = Resize {
            original_width: 3000,
            original_height: 2000,
            width: 1920,
            height: 1280,
        };
        assert_eq!(resize.to_string(), "3000x2000 -> 1920x1280");
    }

    #[test]
    fn test_normalize_color_modes() {
        let inputs = vec![
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 0]))),
            DynamicImage::ImageLuma8(GrayImage::new(4, 3)),
            DynamicImage::ImageLumaA8(GrayAlphaImage::new(4, 3)),
            DynamicImage::ImageRgb8(RgbImage::new(4, 3)),
            DynamicImage::new_rgb16(4, 3),
            DynamicImage::new_rgba32f(4, 3),
        ];

        for input in inputs {
            let rgb = normalize_color(input);
            assert_eq!(rgb.dimensions(), (4, 3));
        }

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 0])));
        assert_eq!(normalize_color(rgba).get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_transform_result_accounting() {
        let result = TransformResult::new("a.png".into(), "a.jpeg".into(), 1000, 250, None);
        assert_eq!(result.saved, 750);
        assert_eq!(result.pct, 75.0);

        let grown = TransformResult::new("b.jpeg".into(), "b.jpeg".into(), 100, 160, None);
        assert_eq!(grown.saved, -60);
        assert_eq!(grown.pct, -60.0);

        let empty = TransformResult::new("c.bmp".into(), "c.jpeg".into(), 0, 300, None);
        assert_eq!(empty.saved, -300);
        assert_eq!(empty.pct, 0.0);
    }

    #[tokio::test]
    async fn test_transform_wide_rgba_png() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.png");
        RgbaImage::from_fn(2400, 1600, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200]))
            .save_with_format(&input, ImageFormat::Png)
            .unwrap();
        let before = std::fs::metadata(&input).unwrap().len();

        let result = processor_for(temp_dir.path()).transform(&input).await.unwrap();

        let output = temp_dir.path().join("photo.jpeg");
        assert!(!input.exists());
        assert!(output.exists());
        assert_eq!(only_entries(temp_dir.path()), vec!["photo.jpeg"]);

        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1920, 1280));
        assert_eq!(decoded.color(), ColorType::Rgb8);

        assert_eq!(result.original, "photo.png");
        assert_eq!(result.output, "photo.jpeg");
        assert_eq!(result.before, before);
        assert_eq!(result.after, std::fs::metadata(&output).unwrap().len());
        assert_eq!(result.saved, result.before as i64 - result.after as i64);
        assert_eq!(result.resized.unwrap().to_string(), "2400x1600 -> 1920x1280");
    }

    #[tokio::test]
    async fn test_transform_every_supported_extension() {
        let cases = [
            ("jpg", ImageFormat::Jpeg),
            ("jpeg", ImageFormat::Jpeg),
            ("png", ImageFormat::Png),
            ("webp", ImageFormat::WebP),
            ("bmp", ImageFormat::Bmp),
            ("tiff", ImageFormat::Tiff),
        ];

        for (ext, format) in cases {
            let temp_dir = TempDir::new().unwrap();
            let input = temp_dir.path().join(format!("sample.{}", ext));
            gradient_rgb(64, 48).save_with_format(&input, format).unwrap();

            let result = processor_for(temp_dir.path()).transform(&input).await.unwrap();

            assert_eq!(only_entries(temp_dir.path()), vec!["sample.jpeg"], "{}", ext);
            assert_eq!(result.output, "sample.jpeg");
            assert!(result.resized.is_none());

            let decoded = image::open(temp_dir.path().join("sample.jpeg")).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (64, 48));
            assert_eq!(decoded.color(), ColorType::Rgb8);
        }
    }

    #[tokio::test]
    async fn test_transform_writes_progressive_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("scan.png");
        gradient_rgb(120, 80).save_with_format(&input, ImageFormat::Png).unwrap();

        processor_for(temp_dir.path()).transform(&input).await.unwrap();

        let bytes = std::fs::read(temp_dir.path().join("scan.jpeg")).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(frame_marker(&bytes), Some(0xC2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transform_keeps_input_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let processor = processor_for(temp_dir.path());

        for (name, mode) in [("public.png", 0o644), ("shared.jpeg", 0o640)] {
            let input = temp_dir.path().join(name);
            gradient_rgb(40, 30).save(&input).unwrap();
            std::fs::set_permissions(&input, std::fs::Permissions::from_mode(mode)).unwrap();

            let result = processor.transform(&input).await.unwrap();

            let output = temp_dir.path().join(&result.output);
            let actual = std::fs::metadata(&output).unwrap().permissions().mode() & 0o777;
            assert_eq!(actual, mode, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_transform_palette_png_becomes_rgb() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("indexed.png");
        {
            let file = std::fs::File::create(&input).unwrap();
            let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 16, 8);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);
            encoder.set_trns(vec![255, 128, 0, 255]);
            let mut writer = encoder.write_header().unwrap();
            let indices: Vec<u8> = (0..16 * 8).map(|i| (i % 4) as u8).collect();
            writer.write_image_data(&indices).unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(image::open(&input).unwrap().color(), ColorType::Rgba8);

        processor_for(temp_dir.path()).transform(&input).await.unwrap();

        let decoded = image::open(temp_dir.path().join("indexed.jpeg")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[tokio::test]
    async fn test_transform_grayscale_inputs_become_rgb() {
        let temp_dir = TempDir::new().unwrap();
        let gray = temp_dir.path().join("gray.png");
        let gray_alpha = temp_dir.path().join("gray_alpha.png");
        GrayImage::from_fn(32, 32, |x, _| image::Luma([(x * 8) as u8]))
            .save_with_format(&gray, ImageFormat::Png)
            .unwrap();
        GrayAlphaImage::from_fn(32, 32, |x, y| image::LumaA([(x * 8) as u8, (y * 8) as u8]))
            .save_with_format(&gray_alpha, ImageFormat::Png)
            .unwrap();

        let processor = processor_for(temp_dir.path());
        processor.transform(&gray).await.unwrap();
        processor.transform(&gray_alpha).await.unwrap();

        for name in ["gray.jpeg", "gray_alpha.jpeg"] {
            let decoded = image::open(temp_dir.path().join(name)).unwrap();
            assert_eq!(decoded.color(), ColorType::Rgb8, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_transform_never_upscales() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("exact.png");
        gradient_rgb(1920, 10).save_with_format(&input, ImageFormat::Png).unwrap();

        let result = processor_for(temp_dir.path()).transform(&input).await.unwrap();
        assert!(result.resized.is_none());

        let decoded = image::open(temp_dir.path().join("exact.jpeg")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1920, 10));
    }

    #[tokio::test]
    async fn test_transform_corrupt_file_leaves_original() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.png");
        std::fs::write(&input, b"this is not an image").unwrap();

        let result = processor_for(temp_dir.path()).transform(&input).await;

        assert!(matches!(result, Err(OptimizeError::Image(_))));
        assert_eq!(only_entries(temp_dir.path()), vec!["broken.png"]);
    }

    #[tokio::test]
    async fn test_transform_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("missing.png");

        let result = processor_for(temp_dir.path()).transform(&input).await;
        assert!(matches!(result, Err(OptimizeError::Io(_))));
    }
}
