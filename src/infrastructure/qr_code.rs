//! QR code rendering to PNG data URLs

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, thiserror::Error)]
pub enum QrRenderError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode `content` with error correction level H, black on white, at least
/// `width` pixels square (rounded up to whole modules), as a PNG data URL.
pub fn render_png_data_url(content: &str, width: u32) -> Result<String, QrRenderError> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::H)?;
    let image = code
        .render::<Luma<u8>>()
        .dark_color(Luma([0u8]))
        .light_color(Luma([255u8]))
        .min_dimensions(width, width)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Decode a PNG data URL produced by `render_png_data_url` back to text.
    pub fn decode_data_url(data_url: &str) -> String {
        let encoded = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .expect("png data url prefix");
        let png = STANDARD.decode(encoded).expect("valid base64");
        let img = image::load_from_memory(&png).expect("valid png").to_luma8();
        let (w, h) = img.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            img.get_pixel(x as u32, y as u32).0[0]
        });
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code");
        let (_, content) = grids[0].decode().expect("decodable QR");
        content
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::decode_data_url;
    use super::*;

    #[test]
    fn rendered_code_decodes_to_input() {
        let url = "http://localhost:3000/verify-driver/abc?name=Ravi%20K&email=ravi%40campus.edu";
        let data_url = render_png_data_url(url, 300).unwrap();
        assert!(data_url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(decode_data_url(&data_url), url);
    }

    #[test]
    fn image_is_at_least_requested_width() {
        let data_url = render_png_data_url("hello", 300).unwrap();
        let png = STANDARD
            .decode(data_url.trim_start_matches(PNG_DATA_URL_PREFIX))
            .unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert!(img.width() >= 300);
        assert_eq!(img.width(), img.height());
    }
}
