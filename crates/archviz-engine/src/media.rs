use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;

const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Raw image payload plus the MIME type sent to or received from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageBytes {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Wraps bytes whose format is sniffed; unknown formats are sent as JPEG.
    pub fn sniffed(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_image_mime(&bytes);
        Self { bytes, mime_type }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
        if bytes.is_empty() {
            anyhow::bail!("image {} is empty", path.display());
        }
        Ok(Self::sniffed(bytes))
    }

    /// Accepts `data:<mime>;base64,<payload>` URIs such as history entries.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .context("not a data URI")?;
        let (header, payload) = rest.split_once(',').context("data URI has no payload")?;
        let mime_type = header
            .strip_suffix(";base64")
            .context("only base64 data URIs are supported")?;
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .context("data URI base64 decode failed")?;
        let mime_type = if mime_type.is_empty() {
            sniff_image_mime(&bytes)
        } else {
            mime_type.to_string()
        };
        Ok(Self { bytes, mime_type })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBytes {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl VideoBytes {
    pub fn mp4(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "video/mp4".to_string(),
        }
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

pub fn sniff_image_mime(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .ok()
        .filter(|format| {
            matches!(
                format,
                ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif
            )
        })
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string())
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn sniffs_png_and_falls_back_to_jpeg() {
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&[0u8; 16]);
        assert_eq!(sniff_image_mime(&png), "image/png");
        assert_eq!(sniff_image_mime(b"not an image"), "image/jpeg");
    }

    #[test]
    fn data_uri_parses_back_to_bytes() -> anyhow::Result<()> {
        let image = ImageBytes::new(vec![1, 2, 3], "image/png");
        assert_eq!(image.data_uri(), "data:image/png;base64,AQID");
        assert_eq!(ImageBytes::from_data_uri(&image.data_uri())?, image);
        assert!(ImageBytes::from_data_uri("file:///tmp/a.png").is_err());
        Ok(())
    }

    #[test]
    fn reads_files_and_rejects_empty_ones() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("sketch.png");
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&[0u8; 16]);
        fs::write(&path, &png)?;
        let image = ImageBytes::from_path(&path)?;
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.extension(), "png");

        let empty = temp.path().join("empty.jpg");
        fs::write(&empty, b"")?;
        assert!(ImageBytes::from_path(&empty).is_err());
        Ok(())
    }

    #[test]
    fn extensions_follow_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(VideoBytes::mp4(Vec::new()).extension(), "mp4");
        assert_eq!(extension_for_mime("application/octet-stream"), "bin");
    }
}
