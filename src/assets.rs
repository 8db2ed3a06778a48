use std::{
    fmt,
    path::{Path, PathBuf},
};

use image::RgbaImage;
use thiserror::Error;

use crate::config::AssetSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    Index,
    Middle,
    Thumb,
    Tongue,
}

impl OverlayKind {
    pub fn label(&self) -> &'static str {
        match self {
            OverlayKind::Index => "index finger",
            OverlayKind::Middle => "middle finger",
            OverlayKind::Thumb => "thumb up",
            OverlayKind::Tongue => "tongue out",
        }
    }

    fn file_name(&self, set: AssetSet) -> &'static str {
        match (set, self) {
            (AssetSet::Meme, OverlayKind::Index) => "meme_index_finger.jpg",
            (AssetSet::Meme, OverlayKind::Middle) => "meme_middle_finger.jpg",
            (AssetSet::Meme, OverlayKind::Thumb) => "meme_thumb_up.jpeg",
            (AssetSet::Meme, OverlayKind::Tongue) => "meme_tongue_out.png",
            (AssetSet::Classic, OverlayKind::Index) => "index_finger.png",
            (AssetSet::Classic, OverlayKind::Middle) => "middle_finger.png",
            (AssetSet::Classic, OverlayKind::Thumb) => "thumb_up.png",
            (AssetSet::Classic, OverlayKind::Tongue) => "tongue_out.png",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{kind} overlay not found at {}", path.display())]
    Missing { kind: OverlayKind, path: PathBuf },
    #[error("failed to decode {kind} overlay {}", path.display())]
    Decode {
        kind: OverlayKind,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayPaths {
    pub index: PathBuf,
    pub middle: PathBuf,
    pub thumb: PathBuf,
    pub tongue: PathBuf,
}

impl OverlayPaths {
    pub fn for_set(dir: &Path, set: AssetSet) -> Self {
        let path = |kind: OverlayKind| dir.join(kind.file_name(set));
        Self {
            index: path(OverlayKind::Index),
            middle: path(OverlayKind::Middle),
            thumb: path(OverlayKind::Thumb),
            tongue: path(OverlayKind::Tongue),
        }
    }

    pub fn get(&self, kind: OverlayKind) -> &Path {
        match kind {
            OverlayKind::Index => &self.index,
            OverlayKind::Middle => &self.middle,
            OverlayKind::Thumb => &self.thumb,
            OverlayKind::Tongue => &self.tongue,
        }
    }
}

/// Overlay rasters, decoded once at startup and kept at their source size.
#[derive(Debug)]
pub struct Overlays {
    index: RgbaImage,
    middle: RgbaImage,
    thumb: RgbaImage,
    tongue: Option<RgbaImage>,
}

impl Overlays {
    pub fn new(
        index: RgbaImage,
        middle: RgbaImage,
        thumb: RgbaImage,
        tongue: Option<RgbaImage>,
    ) -> Self {
        Self {
            index,
            middle,
            thumb,
            tongue,
        }
    }

    /// Loads every overlay. A required overlay that cannot be read aborts the
    /// load; an unreadable tongue overlay is logged and left out.
    pub fn load(paths: &OverlayPaths) -> Result<Self, AssetError> {
        let index = load_overlay(OverlayKind::Index, paths.get(OverlayKind::Index))?;
        let middle = load_overlay(OverlayKind::Middle, paths.get(OverlayKind::Middle))?;
        let thumb = load_overlay(OverlayKind::Thumb, paths.get(OverlayKind::Thumb))?;

        let tongue = match load_overlay(OverlayKind::Tongue, paths.get(OverlayKind::Tongue)) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("{err}; tongue detection is disabled for this run");
                None
            }
        };

        Ok(Self::new(index, middle, thumb, tongue))
    }

    pub fn get(&self, kind: OverlayKind) -> Option<&RgbaImage> {
        match kind {
            OverlayKind::Index => Some(&self.index),
            OverlayKind::Middle => Some(&self.middle),
            OverlayKind::Thumb => Some(&self.thumb),
            OverlayKind::Tongue => self.tongue.as_ref(),
        }
    }

    pub fn has_tongue(&self) -> bool {
        self.tongue.is_some()
    }
}

fn load_overlay(kind: OverlayKind, path: &Path) -> Result<RgbaImage, AssetError> {
    if !path.is_file() {
        return Err(AssetError::Missing {
            kind,
            path: path.to_path_buf(),
        });
    }

    let image = image::open(path).map_err(|source| AssetError::Decode {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "loaded {kind} overlay {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image.to_rgba8())
}
