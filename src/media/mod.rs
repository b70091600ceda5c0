//! Media files kept under the upload root.
//!
//! Every directory is keyed by the owning record's id, never by its title:
//!
//! - `images/<kind>/<id>/<uuid>.webp` for gallery and avatar images
//! - `images/bluePrints/<id>/<uuid>.webp` for blueprints
//! - `factSheets/<id>/<uuid>.pdf` for fact sheets
//!
//! Writes go through a [`MediaBatch`]: uploads are staged in a directory that
//! is never served, moved into place while the store transaction is still
//! open, and discarded if anything fails before commit. Files replaced by a
//! committed update are collected in the background.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::{DynamicImage, ImageFormat};
use url::Url;
use uuid::Uuid;

use crate::error::AppError;

pub const BLUEPRINTS: &str = "bluePrints";
pub const FACT_SHEETS: &str = "factSheets";
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    staging: PathBuf,
    public_base: Url,
}

impl MediaStore {
    /// `root_path` is the public base URL of the service; files are served below `uploads/`.
    pub fn new(root: PathBuf, staging: PathBuf, root_path: Url) -> Self {
        let public_base = root_path
            .join("uploads/")
            .unwrap_or_else(|_| root_path.clone());
        Self {
            root,
            staging,
            public_base,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_for(&self, relative: &str) -> String {
        format!("{}{}", self.public_base, relative)
    }

    /// Maps a URL produced by [`MediaStore::url_for`] back to its path below the root.
    pub fn relative_path(&self, url: &str) -> Option<PathBuf> {
        let parsed = Url::parse(url).ok()?;
        if parsed.origin() != self.public_base.origin() {
            return None;
        }
        let relative = parsed.path().strip_prefix(self.public_base.path())?;
        if relative.is_empty()
            || relative
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return None;
        }
        Some(PathBuf::from(relative))
    }

    /// Directories that can hold files of the record `owner` of media kind `kind`.
    pub fn owner_dirs(&self, kind: &str, owner: Uuid) -> Vec<PathBuf> {
        let owner = owner.to_string();
        vec![
            self.root.join("images").join(kind).join(&owner),
            self.root.join("images").join(BLUEPRINTS).join(&owner),
            self.root.join(FACT_SHEETS).join(&owner),
        ]
    }

    pub fn batch(&self) -> MediaBatch {
        MediaBatch {
            dir: self.staging.join(Uuid::new_v4().to_string()),
            store: self.clone(),
            staged: Vec::new(),
            promoted: Vec::new(),
            done: false,
        }
    }

    /// Clears batches left behind by a previous process.
    pub async fn sweep_staging(&self) -> std::io::Result<()> {
        delete_path(&self.staging).await?;
        tokio::fs::create_dir_all(&self.staging).await
    }

    /// Removes every file of a deleted record. Failures are only logged.
    pub async fn purge(&self, kind: &str, owner: Uuid) {
        for dir in self.owner_dirs(kind, owner) {
            if let Err(e) = delete_path(&dir).await {
                tracing::warn!(path = %dir.display(), error = %e, "failed to purge media directory");
            }
        }
    }

    /// Deletes superseded files in a background task.
    pub fn collect_garbage(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let store = self.clone();
        tokio::spawn(async move {
            store.remove_urls(&urls).await;
        });
    }

    pub async fn remove_urls(&self, urls: &[String]) {
        for url in urls {
            let Some(relative) = self.relative_path(url) else {
                tracing::warn!(%url, "skipping media url outside the upload root");
                continue;
            };
            let path = self.root.join(relative);
            match delete_path(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "removed superseded media"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove media"),
            }
        }
    }
}

/// Uploads written for one request, not yet referenced by a committed record.
///
/// A batch dropped without [`MediaBatch::finish`] or [`MediaBatch::discard`]
/// (the request future was cancelled) removes its files in a background task.
pub struct MediaBatch {
    store: MediaStore,
    dir: PathBuf,
    staged: Vec<(PathBuf, PathBuf)>,
    /// Final paths written by `promote` and not yet kept by a commit.
    promoted: Vec<PathBuf>,
    done: bool,
}

impl MediaBatch {
    /// Re-encodes an uploaded image to WebP and stages it below `images/<folder>/<owner>/`.
    pub async fn stage_image(&mut self, folder: &str, owner: Uuid, data: Bytes) -> Result<String, AppError> {
        let webp = tokio::task::spawn_blocking(move || convert_to_webp(&data))
            .await
            .map_err(|e| AppError::Internal(format!("image conversion task failed: {e}")))?
            .map_err(|e| AppError::BadRequest(format!("Invalid image: {e}")))?;
        let relative = format!("images/{folder}/{owner}/{}.webp", Uuid::new_v4());
        self.stage(relative, webp).await
    }

    pub async fn stage_pdf(&mut self, owner: Uuid, data: Bytes) -> Result<String, AppError> {
        let relative = format!("{FACT_SHEETS}/{owner}/{}.pdf", Uuid::new_v4());
        self.stage(relative, data.to_vec()).await
    }

    async fn stage(&mut self, relative: String, bytes: Vec<u8>) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let staged = self.dir.join(self.staged.len().to_string());
        tokio::fs::write(&staged, bytes).await?;
        let url = self.store.url_for(&relative);
        self.staged.push((staged, self.store.root.join(relative)));
        Ok(url)
    }

    /// Moves staged files to their final paths.
    pub async fn promote(&mut self) -> Result<(), AppError> {
        for (from, to) in std::mem::take(&mut self.staged) {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !rename_path(&from, &to).await? {
                return Err(AppError::Internal(format!(
                    "staged file {} disappeared",
                    from.display()
                )));
            }
            self.promoted.push(to);
        }
        Ok(())
    }

    /// Promoted files now belong to a committed record.
    pub fn keep(&mut self) {
        self.promoted.clear();
    }

    /// Drops everything this batch wrote that was not kept.
    pub async fn discard(mut self) {
        for path in std::mem::take(&mut self.promoted) {
            if let Err(e) = delete_path(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to discard promoted media");
            }
        }
        self.finish().await;
    }

    pub async fn finish(mut self) {
        self.done = true;
        if let Err(e) = delete_path(&self.dir).await {
            tracing::warn!(path = %self.dir.display(), error = %e, "failed to clear staging directory");
        }
    }
}

impl Drop for MediaBatch {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut leftovers = std::mem::take(&mut self.promoted);
        leftovers.push(self.dir.clone());
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(path = %self.dir.display(), "media batch dropped outside a runtime");
            return;
        };
        runtime.spawn(async move {
            for path in leftovers {
                if let Err(e) = delete_path(&path).await {
                    tracing::warn!(path = %path.display(), error = %e, "failed to clean abandoned media");
                }
            }
        });
    }
}

/// Removes a file or directory tree. Missing paths are not an error.
pub async fn delete_path(path: &Path) -> std::io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Returns `false` when `from` does not exist.
pub async fn rename_path(from: &Path, to: &Path) -> std::io::Result<bool> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn convert_to_webp(data: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(data)?;
    // The WebP encoder only takes 8-bit RGB(A).
    let img = DynamicImage::ImageRgba8(img.to_rgba8());
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::WebP)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
