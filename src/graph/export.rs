//! PNG export of the rendered community graph.

use crate::api::GraphQuery;
use egui::ColorImage;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export: the captured area is empty")]
    EmptyCapture,

    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `export_<tab>_<community>_<centrality>.png`
pub fn export_file_name(query: &GraphQuery) -> String {
    format!(
        "export_{}_{}_{}.png",
        sanitize(&query.tab),
        sanitize(&query.community),
        sanitize(&query.centrality)
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Composite a premultiplied capture over opaque white
pub fn flatten_on_white(capture: &ColorImage) -> Result<RgbaImage, ExportError> {
    let [w, h] = capture.size;
    if w == 0 || h == 0 {
        return Err(ExportError::EmptyCapture);
    }

    let mut bytes = Vec::with_capacity(w * h * 4);
    for pixel in &capture.pixels {
        let cover = 255 - pixel.a();
        bytes.push(pixel.r().saturating_add(cover));
        bytes.push(pixel.g().saturating_add(cover));
        bytes.push(pixel.b().saturating_add(cover));
        bytes.push(255);
    }

    RgbaImage::from_raw(w as u32, h as u32, bytes).ok_or(ExportError::EmptyCapture)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Flatten, encode and write the capture into `dir`. Returns the written path.
pub fn write_png(dir: &Path, file_name: &str, capture: &ColorImage) -> Result<PathBuf, ExportError> {
    let png = encode_png(&flatten_on_white(capture)?)?;

    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    std::fs::write(&path, png).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!("Exported graph to {}", path.display());
    Ok(path)
}

/// Where exports go when no directory is configured
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    #[test]
    fn file_name_follows_query() {
        assert_eq!(
            export_file_name(&GraphQuery::default()),
            "export_user_user_retweet_louvain_community_page_rank_centrality.png"
        );
        let query = GraphQuery {
            tab: "a/b".into(),
            ..GraphQuery::default()
        };
        assert!(export_file_name(&query).starts_with("export_a_b_"));
    }

    #[test]
    fn transparent_becomes_white() {
        let capture = ColorImage::new([2, 1], Color32::TRANSPARENT);
        let flat = flatten_on_white(&capture).unwrap();
        assert!(flat.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn opaque_pixels_are_kept() {
        let mut capture = ColorImage::new([1, 1], Color32::TRANSPARENT);
        capture.pixels[0] = Color32::from_rgb(10, 20, 30);
        let flat = flatten_on_white(&capture).unwrap();
        assert_eq!(flat.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn half_transparent_black_is_grey() {
        let mut capture = ColorImage::new([1, 1], Color32::TRANSPARENT);
        capture.pixels[0] = Color32::from_black_alpha(128);
        let flat = flatten_on_white(&capture).unwrap();
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127, 255]);
    }

    #[test]
    fn empty_capture_is_an_error() {
        let capture = ColorImage::new([0, 0], Color32::TRANSPARENT);
        assert!(matches!(flatten_on_white(&capture), Err(ExportError::EmptyCapture)));
    }

    #[test]
    fn writes_png_file() {
        let dir = std::env::temp_dir().join(format!("cocktail-export-{}", std::process::id()));
        let capture = ColorImage::new([4, 3], Color32::RED);
        let path = write_png(&dir, "export_test.png", &capture).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
