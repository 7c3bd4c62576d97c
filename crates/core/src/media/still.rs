//! Still image decode/encode through the `image` crate.

use image::ImageReader;
use std::path::{Path, PathBuf};

use super::error::MediaError;
use super::Frame;

/// Decodes an image file into an RGB frame.
///
/// The format is sniffed from the content, so a mislabelled extension still
/// decodes. Runs on the blocking pool.
pub async fn read_image(path: &Path) -> Result<Frame, MediaError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(MediaError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let path_buf = path.to_path_buf();
    tokio::task::spawn_blocking(move || decode_blocking(&path_buf))
        .await
        .map_err(|e| MediaError::decode(path, format!("decoder task failed: {}", e)))?
}

/// Encodes a frame to `path` in the format implied by its extension.
pub async fn write_image(path: &Path, frame: &Frame) -> Result<(), MediaError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let path_buf: PathBuf = path.to_path_buf();
    let frame = frame.clone();
    tokio::task::spawn_blocking(move || {
        frame
            .save(&path_buf)
            .map_err(|e| MediaError::encode(&path_buf, e.to_string()))
    })
    .await
    .map_err(|e| MediaError::encode(path, format!("encoder task failed: {}", e)))?
}

// Any failure to read the input (a directory, no permission) is a decode
// error, not an I/O failure of the job.
fn decode_blocking(path: &Path) -> Result<Frame, MediaError> {
    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| MediaError::decode(path, e.to_string()))?
        .decode()
        .map_err(|e| MediaError::decode(path, e.to_string()))?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("frame.png");
        let frame = Frame::from_pixel(4, 3, Rgb([10, 20, 30]));

        write_image(&path, &frame).await.unwrap();
        let decoded = read_image(&path).await.unwrap();

        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 1), &Rgb([10, 20, 30]));
    }

    #[tokio::test]
    async fn test_read_missing_image() {
        let err = read_image(Path::new("/nonexistent/frame.png")).await.unwrap_err();
        assert!(matches!(err, MediaError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = read_image(&path).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_read_directory_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::create_dir(&path).unwrap();

        let err = read_image(&path).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode { .. }));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_write_unknown_extension_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.unknownext");
        let frame = Frame::new(2, 2);

        let err = write_image(&path, &frame).await.unwrap_err();
        assert!(matches!(err, MediaError::Encode { .. }));
    }
}
