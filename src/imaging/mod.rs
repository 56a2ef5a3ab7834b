// Server-side photo normalization for vehicle listings.
//
// Every storefront photo is published at the same geometry the big listing
// portals use: 4:3, bounded at 1920x1440, JPEG at 75% quality. Uploads arrive
// in whatever the operator's phone produced (HEIC-exported JPEG, PNG with
// alpha, WEBP screenshots) and are reshaped here before touching storage.

use futures::stream::{self, StreamExt};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

/// Output geometry and encoding knobs. Injected rather than read from the
/// global config so unit tests can use small canvases.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1440,
            jpeg_quality: 75,
        }
    }
}

/// An uploaded file as it came off the multipart stream.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A normalized photo ready for storage: always JPEG, always 4:3.
#[derive(Debug, Clone)]
pub struct NormalizedPhoto {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("formato de arquivo não suportado: {0}")]
    UnsupportedFormat(String),
    #[error("falha ao decodificar imagem: {0}")]
    Decode(String),
    #[error("falha ao codificar imagem: {0}")]
    Encode(String),
}

const TARGET_CONTENT_TYPE: &str = "image/jpeg";

/// Normalizes one photo: decode, center-crop to 4:3, bound to the configured
/// maximum (never upscaling), flatten transparency onto white, encode JPEG.
///
/// Pure single-attempt computation; failures are final and the caller skips
/// the file without aborting the rest of the batch.
pub fn normalize(upload: &RawUpload, opts: &NormalizeOptions) -> Result<NormalizedPhoto, ImageError> {
    if !upload.content_type.starts_with("image/") {
        return Err(ImageError::UnsupportedFormat(upload.content_type.clone()));
    }

    let source = image::load_from_memory(&upload.bytes)
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let (width, height) = (source.width(), source.height());

    let (crop_x, crop_y, crop_w, crop_h) = crop_box(width, height);
    let (out_w, out_h) = output_dims(crop_w, crop_h, opts.max_width, opts.max_height);

    let cropped = source.crop_imm(crop_x, crop_y, crop_w, crop_h);
    let scaled = if (crop_w, crop_h) != (out_w, out_h) {
        cropped.resize_exact(out_w, out_h, FilterType::Triangle)
    } else {
        cropped
    };

    // Flatten onto opaque white so transparent PNG regions do not come out
    // black once the alpha channel is gone.
    let mut canvas = RgbaImage::from_pixel(out_w, out_h, Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, &scaled.to_rgba8(), 0, 0);
    let flattened = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, opts.jpeg_quality);
    encoder
        .encode_image(&flattened)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(NormalizedPhoto {
        name: derived_name(&upload.name),
        content_type: TARGET_CONTENT_TYPE,
        bytes,
    })
}

/// Normalizes a batch with a small bounded window on the blocking pool.
/// Each file is independent: one failure is reported in its slot and the
/// others still land. Input order is preserved.
pub async fn normalize_batch(
    uploads: Vec<RawUpload>,
    opts: NormalizeOptions,
    concurrency: usize,
) -> Vec<(String, Result<NormalizedPhoto, ImageError>)> {
    stream::iter(uploads)
        .map(|upload| async move {
            let name = upload.name.clone();
            let result = tokio::task::spawn_blocking(move || normalize(&upload, &opts))
                .await
                .unwrap_or_else(|e| Err(ImageError::Encode(format!("worker abortado: {e}"))));
            (name, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Symmetric 4:3 crop window over a `width` x `height` source.
/// Wider sources lose columns left and right; taller sources lose rows top
/// and bottom. Integer division keeps the result within 1px of exact 4:3.
fn crop_box(width: u32, height: u32) -> (u32, u32, u32, u32) {
    let w = width as u64;
    let h = height as u64;

    if w * 3 > h * 4 {
        let crop_w = (h * 4 / 3) as u32;
        let crop_x = (width - crop_w) / 2;
        (crop_x, 0, crop_w, height)
    } else if w * 3 < h * 4 {
        let crop_h = (w * 3 / 4) as u32;
        let crop_y = (height - crop_h) / 2;
        (0, crop_y, width, crop_h)
    } else {
        (0, 0, width, height)
    }
}

/// Output canvas is the configured maximum unless the cropped region is
/// smaller in both dimensions, in which case it is kept as-is (no upscaling).
fn output_dims(crop_w: u32, crop_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if crop_w < max_w && crop_h < max_h {
        (crop_w, crop_h)
    } else {
        (max_w, max_h)
    }
}

fn derived_name(original: &str) -> String {
    let stem = match original.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => original,
    };
    format!("{stem}-otimizado.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_upload(width: u32, height: u32, pixel: Rgba<u8>) -> RawUpload {
        let img = RgbaImage::from_pixel(width, height, pixel);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encode");
        RawUpload {
            name: "foto.png".to_string(),
            content_type: "image/png".to_string(),
            bytes,
        }
    }

    fn decoded(photo: &NormalizedPhoto) -> DynamicImage {
        image::load_from_memory(&photo.bytes).expect("jpeg decode")
    }

    fn assert_four_by_three(w: u32, h: u32) {
        // Within 1px of exact 4:3 after integer rounding.
        let expected_w = (h as u64 * 4 / 3) as i64;
        assert!(
            (w as i64 - expected_w).abs() <= 1,
            "{w}x{h} is not 4:3 (expected width ~{expected_w})"
        );
    }

    #[test]
    fn wide_source_is_cropped_to_ratio() {
        let (x, y, w, h) = crop_box(2000, 500);
        assert_eq!((y, h), (0, 500));
        assert_eq!(w, 666);
        assert_eq!(x, 667);
        assert_four_by_three(w, h);
    }

    #[test]
    fn tall_source_is_cropped_to_ratio() {
        let (x, y, w, h) = crop_box(600, 1200);
        assert_eq!((x, w), (0, 600));
        assert_eq!(h, 450);
        assert_eq!(y, 375);
        assert_four_by_three(w, h);
    }

    #[test]
    fn exact_ratio_is_untouched() {
        assert_eq!(crop_box(800, 600), (0, 0, 800, 600));
    }

    #[test]
    fn small_sources_are_never_upscaled() {
        assert_eq!(output_dims(800, 600, 1920, 1440), (800, 600));
        // Only strictly-smaller-in-both skips the fixed canvas.
        assert_eq!(output_dims(1920, 600, 1920, 1440), (1920, 1440));
        assert_eq!(output_dims(4000, 3000, 1920, 1440), (1920, 1440));
    }

    #[test]
    fn normalize_bounds_large_images() {
        let upload = png_upload(4000, 3000, Rgba([10, 20, 30, 255]));
        let photo = normalize(&upload, &NormalizeOptions::default()).unwrap();
        let img = decoded(&photo);
        assert_eq!((img.width(), img.height()), (1920, 1440));
        assert_eq!(photo.content_type, "image/jpeg");
    }

    #[test]
    fn normalize_keeps_small_cropped_region() {
        let upload = png_upload(1000, 500, Rgba([10, 20, 30, 255]));
        let photo = normalize(&upload, &NormalizeOptions::default()).unwrap();
        let img = decoded(&photo);
        // Crop of a 1000x500 source is 666x500, under the max in both axes.
        assert_eq!((img.width(), img.height()), (666, 500));
        assert_four_by_three(img.width(), img.height());
    }

    #[test]
    fn transparency_is_flattened_to_white() {
        let upload = png_upload(400, 300, Rgba([0, 0, 0, 0]));
        let photo = normalize(&upload, &NormalizeOptions::default()).unwrap();
        let img = decoded(&photo).to_rgb8();
        let px = img.get_pixel(10, 10);
        assert!(
            px.0.iter().all(|&c| c >= 250),
            "expected near-white, got {:?}",
            px
        );
    }

    #[test]
    fn output_is_always_jpeg_named_after_source() {
        let mut upload = png_upload(400, 300, Rgba([255, 0, 0, 255]));
        upload.name = "Frente do Carro.PNG".to_string();
        let photo = normalize(&upload, &NormalizeOptions::default()).unwrap();
        assert_eq!(photo.name, "Frente do Carro-otimizado.jpg");
        assert_eq!(
            image::guess_format(&photo.bytes).expect("format"),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn non_image_declared_type_is_rejected_before_decode() {
        let upload = RawUpload {
            name: "laudo.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            normalize(&upload, &NormalizeOptions::default()),
            Err(ImageError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let upload = RawUpload {
            name: "quebrada.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xde, 0xad, 0xbe, 0xef],
        };
        assert!(matches!(
            normalize(&upload, &NormalizeOptions::default()),
            Err(ImageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn batch_reports_failures_per_file() {
        let good = png_upload(800, 600, Rgba([1, 2, 3, 255]));
        let bad = RawUpload {
            name: "nota.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: vec![],
        };
        let results = normalize_batch(vec![good, bad], NormalizeOptions::default(), 2).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(ImageError::UnsupportedFormat(_))));
        assert_eq!(results[1].0, "nota.txt");
    }
}
