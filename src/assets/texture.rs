use super::AssetError;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image plus the path it came from.
#[derive(Debug, Clone)]
pub struct Texture {
    path: Option<PathBuf>,
    image: RgbaImage,
}

impl Texture {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path)
            .map_err(|source| AssetError::Image {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();
        log::info!(
            "Loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            image,
        })
    }

    /// 1x1 opaque white, used whenever a texture fails to load.
    pub fn placeholder() -> Self {
        Self {
            path: None,
            image: RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
        }
    }

    pub fn load_or_placeholder(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("{err}; using placeholder texture");
            Self::placeholder()
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.is_none()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}
