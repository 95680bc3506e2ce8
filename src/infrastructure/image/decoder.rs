//! Default decoder backed by the `image` crate.

use std::path::Path;

use image::{DynamicImage, ImageReader};
use tracing::trace;

use crate::domain::errors::DecodeError;
use crate::domain::ports::Decoder;

/// Decodes PNG, JPEG and WebP files, sniffing the format from file content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl Decoder for ImageCrateDecoder {
    type Image = DynamicImage;

    fn load(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let reader = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(|e| DecodeError::from_io(path, &e))?;

        let image = reader.decode().map_err(|e| match e {
            image::ImageError::IoError(io) => DecodeError::from_io(path, &io),
            other => DecodeError::Format(format!("{}: {other}", path.display())),
        })?;

        trace!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded image"
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decodes_png() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("tiny.png");
        image::RgbImage::new(4, 3).save(&path)?;

        let decoded = ImageCrateDecoder.load(&path)?;
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = ImageCrateDecoder.load(Path::new("/no/such/image.png"));
        assert!(matches!(result, Err(DecodeError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_format_error() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let path = temp.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png")?;

        let result = ImageCrateDecoder.load(&path);
        assert!(matches!(result, Err(DecodeError::Format(_))));
        Ok(())
    }
}
