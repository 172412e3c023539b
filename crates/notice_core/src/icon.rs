use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::IconLookupError;

/// A decoded project icon, kept as RGBA8 pixels.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIcon {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for ProjectIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectIcon")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl ProjectIcon {
    pub fn from_image(path: impl AsRef<Path>, image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: path.as_ref().to_path_buf(),
            width,
            height,
            rgba: image.into_raw(),
        }
    }

    /// Resize the pixels by an integer factor with nearest-neighbour sampling.
    pub fn scaled(&self, factor: u32) -> Self {
        let Some(image) = RgbaImage::from_raw(self.width, self.height, self.rgba.clone()) else {
            tracing::debug!(path = %self.path.display(), "icon pixels do not match its size");
            return self.clone();
        };
        let resized = imageops::resize(
            &image,
            self.width.saturating_mul(factor),
            self.height.saturating_mul(factor),
            FilterType::Nearest,
        );
        Self::from_image(&self.path, resized)
    }
}

/// Resolves per-project icons. `Ok(None)` means the project has no icon.
pub trait ProjectIconProvider: Send + Sync {
    fn lookup(&self, project_name: &str) -> Result<Option<ProjectIcon>, IconLookupError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProjectIcons;

impl ProjectIconProvider for NoProjectIcons {
    fn lookup(&self, _project_name: &str) -> Result<Option<ProjectIcon>, IconLookupError> {
        Ok(None)
    }
}

/// Looks for `<dir>/<slug>.png`, where slug is the lower-cased project name
/// with everything but ASCII alphanumerics replaced by `_`.
#[derive(Debug, Clone)]
pub struct DirectoryIconProvider {
    dir: PathBuf,
}

impl DirectoryIconProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn icon_path(&self, project_name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", project_slug(project_name)))
    }
}

impl ProjectIconProvider for DirectoryIconProvider {
    fn lookup(&self, project_name: &str) -> Result<Option<ProjectIcon>, IconLookupError> {
        let path = self.icon_path(project_name);
        if !path.is_file() {
            return Ok(None);
        }
        let decoded = image::open(&path).map_err(|source| IconLookupError::Decode {
            project: project_name.to_string(),
            source,
        })?;
        Ok(Some(ProjectIcon::from_image(path, decoded.to_rgba8())))
    }
}

pub fn project_slug(project_name: &str) -> String {
    project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
