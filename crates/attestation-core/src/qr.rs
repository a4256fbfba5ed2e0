//! QR code rasterisation
//!
//! The matrix comes from `qrcode` at error-correction level M. It is
//! rasterised here to an 8-bit grayscale bitmap with a one-module quiet
//! zone, which is then exported as PNG, as a data URL, or as a Flate
//! stream for a PDF image XObject.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use qrcode::{Color, EcLevel, QrCode};

use crate::error::AttestationError;

/// Pixels per module
pub const MODULE_SCALE: u32 = 4;
/// Quiet zone around the symbol, in modules
pub const QUIET_ZONE: u32 = 1;

const DARK: u8 = 0x00;
const LIGHT: u8 = 0xFF;

/// A rasterised QR code, row-major, one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    width: u32,
    modules: u32,
    pixels: Vec<u8>,
}

/// Encode `text` into a QR raster.
///
/// Errors are returned, never swallowed: an attestation without its code
/// is not a valid document.
pub fn encode(text: &str) -> Result<QrImage, AttestationError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
        .map_err(|e| AttestationError::QrEncode(e.to_string()))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = modules + 2 * QUIET_ZONE;
    let width = side * MODULE_SCALE;

    let mut pixels = vec![LIGHT; (width * width) as usize];
    for (index, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = index as u32 % modules + QUIET_ZONE;
        let my = index as u32 / modules + QUIET_ZONE;
        for dy in 0..MODULE_SCALE {
            let row = (my * MODULE_SCALE + dy) * width;
            let start = (row + mx * MODULE_SCALE) as usize;
            pixels[start..start + MODULE_SCALE as usize].fill(DARK);
        }
    }

    tracing::debug!(modules, width, bytes = text.len(), "encoded QR code");

    Ok(QrImage {
        width,
        modules,
        pixels,
    })
}

impl QrImage {
    /// Side length in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Side length of the symbol in modules, quiet zone excluded
    pub fn modules(&self) -> u32 {
        self.modules
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether the module at (`x`, `y`) is dark. Coordinates are in modules
    /// and include the quiet zone.
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        let px = x * MODULE_SCALE;
        let py = y * MODULE_SCALE;
        if px >= self.width || py >= self.width {
            return false;
        }
        self.pixels[(py * self.width + px) as usize] == DARK
    }

    /// PNG-encoded grayscale image
    pub fn to_png(&self) -> Result<Vec<u8>, AttestationError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.width);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| AttestationError::QrEncode(e.to_string()))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| AttestationError::QrEncode(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| AttestationError::QrEncode(e.to_string()))?;
        }
        Ok(out)
    }

    /// `data:image/png;base64,...` URL for previews
    pub fn to_data_url(&self) -> Result<String, AttestationError> {
        Ok(format!("data:image/png;base64,{}", BASE64.encode(self.to_png()?)))
    }

    /// Zlib-compressed pixels, ready for a `/FlateDecode` image stream
    pub fn to_flate(&self) -> Result<Vec<u8>, AttestationError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.pixels)
            .map_err(|e| AttestationError::QrEncode(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| AttestationError::QrEncode(e.to_string()))
    }
}
