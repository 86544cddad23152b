use std::{fs, io::BufWriter, path::Path};

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use uuid::Uuid;

use super::{CaptureError, CapturedImage};
use crate::settings::CaptureSettings;

const ENABLE_LOGS: bool = true;
use crate::log_debug;

/// Downsamples a raw frame to `settings.max_width` and re-encodes it as JPEG
/// in `dir`. Decoding and encoding run on the blocking pool.
pub async fn compress_frame(
    frame: Vec<u8>,
    settings: &CaptureSettings,
    dir: &Path,
) -> Result<CapturedImage, CaptureError> {
    let settings = settings.clone();
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || compress_frame_blocking(&frame, &settings, &dir))
        .await
        .map_err(|e| CaptureError::Worker(e.to_string()))?
}

fn compress_frame_blocking(
    frame: &[u8],
    settings: &CaptureSettings,
    dir: &Path,
) -> Result<CapturedImage, CaptureError> {
    let decoded = image::load_from_memory(frame).map_err(CaptureError::Decode)?;
    let resized = fit_width(decoded, settings.max_width);

    fs::create_dir_all(dir).map_err(|source| CaptureError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let path = dir.join(format!("{}.jpg", Uuid::new_v4()));
    write_jpeg(&resized, &path, settings.encoder_quality())?;

    let byte_len = fs::metadata(&path)
        .map(|meta| meta.len())
        .map_err(|source| CaptureError::Io {
            path: path.display().to_string(),
            source,
        })?;

    log_debug!(
        "compressed frame to {}x{} ({} bytes)",
        resized.width(),
        resized.height(),
        byte_len
    );

    Ok(CapturedImage {
        path,
        width: resized.width(),
        height: resized.height(),
        byte_len,
    })
}

/// Never upscales; keeps the aspect ratio.
fn fit_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if max_width == 0 || width <= max_width {
        return image;
    }
    let scaled_height = ((height as u64 * max_width as u64) as f64 / width as f64).round() as u32;
    image.resize_exact(max_width, scaled_height.max(1), FilterType::Lanczos3)
}

fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), CaptureError> {
    let file = fs::File::create(path).map_err(|source| CaptureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&rgb)
        .map_err(CaptureError::Encode)
}
