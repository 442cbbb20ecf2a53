//! Image files through the `image` crate
//!
//! Decoded rows are reversed so row 0 is the bottom row, the order texture
//! uploads expect; the image records this in its flip flag and writing
//! undoes it.

use std::path::Path;

use ::image::{ColorType, DynamicImage};

use crate::render::{DataType, Image, PixelFormat};

use super::{ImageError, Status};

/// Decode an image file
pub fn read_image(path: impl AsRef<Path>) -> (Option<Image>, Status, String) {
    let path = path.as_ref();
    let file_name = path.display().to_string();

    if !path.exists() {
        return (None, Status::FileNotFound, format!("{} not found!", file_name));
    }
    let result = std::fs::read(path)
        .map_err(ImageError::from)
        .and_then(|bytes| decode(&bytes));

    match result {
        Ok(mut image) => {
            image.set_file_name(file_name.clone());
            log::debug!("Loaded image {} ({}x{})", file_name, image.s(), image.t());
            (Some(image), Status::FileLoaded, String::new())
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", file_name, e);
            (None, Status::ErrorInReadingFile, e.to_string())
        }
    }
}

/// Decode an encoded image held in memory
pub fn read_image_from_memory(bytes: &[u8]) -> (Option<Image>, Status, String) {
    match decode(bytes) {
        Ok(image) => (Some(image), Status::FileLoaded, String::new()),
        Err(e) => (None, Status::ErrorInReadingFile, e.to_string()),
    }
}

/// Encode an image as PNG
pub fn write_image(path: impl AsRef<Path>, image: &Image) -> (Status, String) {
    let path = path.as_ref();
    let file_name = path.display().to_string();

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        return (Status::FileNotHandled, format!("{} not support!", file_name));
    }

    match encode(path, image) {
        Ok(()) => {
            log::debug!("Saved image {}", file_name);
            (Status::FileSaved, String::new())
        }
        Err(e) => {
            log::warn!("Failed to write {}: {}", file_name, e);
            (Status::ErrorInWritingFile, e.to_string())
        }
    }
}

fn decode(bytes: &[u8]) -> Result<Image, ImageError> {
    let dynamic = ::image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let (width, height) = (dynamic.width(), dynamic.height());
    let (format, data) = match dynamic {
        DynamicImage::ImageLuma8(buffer) => (PixelFormat::Red, buffer.into_raw()),
        DynamicImage::ImageLumaA8(buffer) => (PixelFormat::Rg, buffer.into_raw()),
        DynamicImage::ImageRgb8(buffer) => (PixelFormat::Rgb, buffer.into_raw()),
        DynamicImage::ImageRgba8(buffer) => (PixelFormat::Rgba, buffer.into_raw()),
        other => (PixelFormat::Rgba, other.into_rgba8().into_raw()),
    };

    let mut image = Image::from_data(width, height, 1, format, DataType::UnsignedByte, 1, data);
    if !image.valid() {
        return Err(ImageError::Decode("decoded image is empty".to_string()));
    }
    image.flip_vertical();
    Ok(image)
}

fn encode(path: &Path, image: &Image) -> Result<(), ImageError> {
    if !image.valid() {
        return Err(ImageError::Encode("image has no pixels".to_string()));
    }
    if image.data_type() != DataType::UnsignedByte || image.r() != 1 {
        return Err(ImageError::UnsupportedFormat(format!(
            "{:?} x {} slices",
            image.data_type(),
            image.r()
        )));
    }

    let color = match image.pixel_format() {
        PixelFormat::Red => ColorType::L8,
        PixelFormat::Rg => ColorType::La8,
        PixelFormat::Rgb => ColorType::Rgb8,
        PixelFormat::Rgba => ColorType::Rgba8,
    };

    let mut upright = image.clone();
    if upright.vertically_flipped() {
        upright.flip_vertical();
    }

    let tight = (image.s() * image.pixel_format().components()) as usize;
    let data: Vec<u8> = upright
        .data()
        .chunks(upright.row_size_in_bytes())
        .take(image.t() as usize)
        .flat_map(|row| &row[..tight])
        .copied()
        .collect();

    ::image::save_buffer(path, &data, image.s(), image.t(), color)
        .map_err(|e| ImageError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dental_scene_image_{}_{}", std::process::id(), name))
    }

    /// 2x2 RGB, 4 byte rows so each row carries two bytes of padding
    fn checker() -> Image {
        let data = vec![
            255, 0, 0, 0, 255, 0, 0, 0, //
            0, 0, 255, 255, 255, 255, 0, 0,
        ];
        Image::from_data(2, 2, 1, PixelFormat::Rgb, DataType::UnsignedByte, 4, data)
    }

    #[test]
    fn test_png_round_trip_flips_rows() {
        let path = scratch("checker.png");
        let (status, message) = write_image(&path, &checker());
        assert_eq!(status, Status::FileSaved, "{}", message);

        let (image, status, _) = read_image(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(status, Status::FileLoaded);

        let image = image.unwrap();
        assert!(image.vertically_flipped());
        assert_eq!(image.pixel_format(), PixelFormat::Rgb);
        assert_eq!(image.packing(), 1);
        assert!(image.file_name().ends_with("checker.png"));
        // file row 0 is now the last row
        assert_eq!(image.pixel(0, 1, 0), Some(&[255, 0, 0][..]));
        assert_eq!(image.pixel(1, 0, 0), Some(&[255, 255, 255][..]));
    }

    #[test]
    fn test_flipped_image_written_upright() {
        let path = scratch("flipped.png");
        let mut image = checker();
        image.flip_vertical();
        write_image(&path, &image);

        let (back, _, _) = read_image(&path);
        std::fs::remove_file(&path).ok();
        let mut back = back.unwrap();
        back.flip_vertical();
        assert_eq!(back.pixel(0, 0, 0), Some(&[255, 0, 0][..]));
    }

    #[test]
    fn test_decode_errors() {
        let (image, status, message) = read_image_from_memory(b"definitely not a png");
        assert!(image.is_none());
        assert_eq!(status, Status::ErrorInReadingFile);
        assert!(!message.is_empty());

        let (_, status, _) = read_image("/definitely/not/here.png");
        assert_eq!(status, Status::FileNotFound);
    }

    #[test]
    fn test_write_rejects_float_and_other_extensions() {
        let float = Image::from_data(1, 1, 1, PixelFormat::Red, DataType::Float, 1, vec![0; 4]);
        let (status, _) = write_image(scratch("float.png"), &float);
        assert_eq!(status, Status::ErrorInWritingFile);

        let (status, _) = write_image(scratch("checker.jpg"), &checker());
        assert_eq!(status, Status::FileNotHandled);
    }
}
