//! Images recorded by the page device.
//!
//! An [`ImageData`] keeps the original encoded bytes plus the header
//! facts backends need up front (dimensions, color space, encoding).
//! The PDF backend embeds JPEG data untouched under DCTDecode and
//! re-compresses other pixels with Flate; the raster path decodes
//! through the `image` crate on demand.

use bytes::Bytes;

/// Source encoding of an image's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// JPEG data (embedded as-is with the DCTDecode filter)
    Jpeg,
    /// PNG data (decoded and re-compressed for embedding)
    Png,
}

/// Color space of decoded image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// Number of color components per pixel.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRGB => 3,
            ColorSpace::DeviceCMYK => 4,
        }
    }

    /// PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Image loading error.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Neither JPEG nor PNG magic bytes found
    #[error("Unrecognized image format")]
    UnrecognizedFormat,

    /// Failed to decode the image header or pixels
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// IO error while reading an image file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded image ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct ImageData {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    encoding: ImageEncoding,
    data: Bytes,
}

impl ImageData {
    /// Load an image from raw bytes, auto-detecting JPEG or PNG.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ImageError> {
        // JPEG magic bytes
        if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
            return Self::from_jpeg(data.to_vec());
        }

        // PNG magic bytes
        if data.len() >= 8 && &data[0..8] == b"\x89PNG\r\n\x1a\n" {
            return Self::from_png(data.to_vec());
        }

        Err(ImageError::UnrecognizedFormat)
    }

    /// Load a JPEG image from raw JPEG data.
    ///
    /// Dimensions and color space are read from the SOF header so the
    /// compressed data never has to be transcoded.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self, ImageError> {
        let (width, height, color_space) = parse_jpeg_header(&data)?;
        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Jpeg,
            data: Bytes::from(data),
        })
    }

    /// Load a PNG image from raw PNG data.
    pub fn from_png(data: Vec<u8>) -> Result<Self, ImageError> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(&data, image::ImageFormat::Png)
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();

        let color_space = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => ColorSpace::DeviceGray,
            image::ColorType::La8 | image::ColorType::La16 => ColorSpace::DeviceGray,
            _ => ColorSpace::DeviceRGB,
        };

        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Png,
            data: Bytes::from(data),
        })
    }

    /// Load an image from a file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ImageError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color space of the decoded samples.
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Source encoding of the bytes.
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// The original encoded bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Parse a JPEG header for dimensions and component count.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace), ImageError> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(ImageError::Decode("not a valid JPEG".to_string()));
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Skip padding
        if marker == 0xFF || marker == 0x00 {
            continue;
        }

        // SOF markers carry the frame header (skip DHT/arithmetic variants)
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            if pos + 7 >= data.len() {
                return Err(ImageError::Decode("truncated JPEG SOF segment".to_string()));
            }
            let height = u32::from(data[pos + 3]) << 8 | u32::from(data[pos + 4]);
            let width = u32::from(data[pos + 5]) << 8 | u32::from(data[pos + 6]);
            let components = data[pos + 7];
            let color_space = match components {
                1 => ColorSpace::DeviceGray,
                3 => ColorSpace::DeviceRGB,
                4 => ColorSpace::DeviceCMYK,
                n => {
                    return Err(ImageError::Decode(format!(
                        "unsupported JPEG component count: {}",
                        n
                    )))
                },
            };
            if width == 0 || height == 0 {
                return Err(ImageError::Decode("zero-sized JPEG frame".to_string()));
            }
            return Ok((width, height, color_space));
        }

        // Other markers: skip their payload using the length field
        if pos + 1 >= data.len() {
            break;
        }
        let len = usize::from(data[pos]) << 8 | usize::from(data[pos + 1]);
        if len < 2 {
            return Err(ImageError::Decode("invalid JPEG segment length".to_string()));
        }
        pos += len;
    }

    Err(ImageError::Decode("no JPEG frame header found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid JPEG header: SOI + SOF0 with a 16x8 3-component frame.
    fn tiny_jpeg_header() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x0B, // segment length 11
            0x08, // bit depth
            0x00, 0x08, // height 8
            0x00, 0x10, // width 16
            0x03, // 3 components
            0x01, 0x11, 0x00,
        ]
    }

    #[test]
    fn test_jpeg_header_parsing() {
        let img = ImageData::from_bytes(&tiny_jpeg_header()).unwrap();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 8);
        assert_eq!(img.color_space(), ColorSpace::DeviceRGB);
        assert_eq!(img.encoding(), ImageEncoding::Jpeg);
    }

    #[test]
    fn test_png_roundtrip_header() {
        use image::ImageEncoder;

        // Encode a tiny PNG via the image crate, then sniff it back
        let mut png = Vec::new();
        let pixels = vec![255u8; 4 * 3 * 3];
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(&pixels, 4, 3, image::ColorType::Rgb8)
            .unwrap();

        let img = ImageData::from_bytes(&png).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 3);
        assert_eq!(img.color_space(), ColorSpace::DeviceRGB);
        assert_eq!(img.encoding(), ImageEncoding::Png);
    }

    #[test]
    fn test_unrecognized_bytes_rejected() {
        let err = ImageData::from_bytes(b"GIF89a...").unwrap_err();
        assert!(matches!(err, ImageError::UnrecognizedFormat));
    }

    #[test]
    fn test_color_space_components() {
        assert_eq!(ColorSpace::DeviceGray.components(), 1);
        assert_eq!(ColorSpace::DeviceRGB.components(), 3);
        assert_eq!(ColorSpace::DeviceCMYK.components(), 4);
        assert_eq!(ColorSpace::DeviceRGB.pdf_name(), "DeviceRGB");
    }
}
