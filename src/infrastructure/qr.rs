//! QR code rendering for short links.
//!
//! Codes always use error correction level H and are rendered in memory.

use image::{ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::Deserialize;
use std::io::Cursor;

pub const DEFAULT_SCALE: u32 = 4;
pub const MAX_SCALE: u32 = 40;
pub const MAX_WIDTH: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("Failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Failed to write PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Output format of a rendered code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            QrFormat::Png => "image/png",
            QrFormat::Svg => "image/svg+xml",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            QrFormat::Png => "shortlink.png",
            QrFormat::Svg => "shortlink.svg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    pub format: QrFormat,
    /// Pixels per module.
    pub scale: u32,
    /// Minimum image width in pixels; overrides `scale` when larger.
    pub width: Option<u32>,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            format: QrFormat::Png,
            scale: DEFAULT_SCALE,
            width: None,
        }
    }
}

/// Renders `data` as a QR code image in the requested format.
///
/// # Errors
///
/// Returns [`QrError::Encode`] if `data` does not fit in a QR code.
pub fn render_qr(data: &str, options: &QrOptions) -> Result<Vec<u8>, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    let scale = options.scale.clamp(1, MAX_SCALE);

    match options.format {
        QrFormat::Png => {
            let mut renderer = code.render::<Luma<u8>>();
            renderer.quiet_zone(true).module_dimensions(scale, scale);
            if let Some(width) = options.width {
                renderer.min_dimensions(width, width);
            }

            let image = renderer.build();
            let mut bytes = Vec::new();
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            Ok(bytes)
        }
        QrFormat::Svg => {
            let mut renderer = code.render::<svg::Color>();
            renderer.quiet_zone(true).module_dimensions(scale, scale);
            if let Some(width) = options.width {
                renderer.min_dimensions(width, width);
            }

            Ok(renderer.build().into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[test]
    fn test_renders_png() {
        let bytes = render_qr("https://s.example.com/AbC12", &QrOptions::default()).unwrap();
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_png_respects_min_width() {
        let options = QrOptions {
            width: Some(500),
            ..QrOptions::default()
        };

        let bytes = render_qr("https://s.example.com/AbC12", &options).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();

        assert!(image.width() >= 500);
    }

    #[test]
    fn test_renders_svg() {
        let options = QrOptions {
            format: QrFormat::Svg,
            ..QrOptions::default()
        };

        let bytes = render_qr("https://s.example.com/AbC12", &options).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("<svg"));
    }

    #[test]
    fn test_rejects_oversized_data() {
        let data = "x".repeat(4000);
        assert!(matches!(
            render_qr(&data, &QrOptions::default()),
            Err(QrError::Encode(_))
        ));
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(QrFormat::Png.file_name(), "shortlink.png");
        assert_eq!(QrFormat::Svg.content_type(), "image/svg+xml");
    }
}
