//! Local staging of post media.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{domain::MediaRef, errors::Error, ports::MediaStager, Result};

const DEFAULT_EXTENSION: &str = "jpg";

/// A media file owned by the item currently being delivered.
///
/// The file is deleted when the guard is released or dropped, on every exit
/// path.
#[derive(Debug)]
pub struct StagedMedia {
    path: PathBuf,
    released: bool,
}

impl StagedMedia {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now and report the outcome.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_if_exists(&self.path)
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_if_exists(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove staged media");
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Stages media from local paths (copy) or http(s) URLs (download).
#[derive(Clone, Debug)]
pub struct FileMediaStager {
    temp_dir: PathBuf,
    http: reqwest::Client,
}

impl FileMediaStager {
    pub fn new(temp_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("media http client: {e}")))?;
        Ok(Self {
            temp_dir: temp_dir.into(),
            http,
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Media(format!("media request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::Media(format!(
                "media download failed: {} {url}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Media(format!("media body error: {e}")))?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| Error::Media(format!("write {}: {e}", dest.display())))
    }
}

#[async_trait]
impl MediaStager for FileMediaStager {
    async fn stage(&self, item_id: i64, media: &MediaRef) -> Result<StagedMedia> {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| Error::Media(format!("create {}: {e}", self.temp_dir.display())))?;

        let dest = self
            .temp_dir
            .join(format!("photo_{item_id}.{}", media_extension(media)));
        // Guard first so a partial write is cleaned up too.
        let staged = StagedMedia::new(&dest);

        if media.is_remote() {
            self.download(&media.0, &dest).await?;
        } else {
            tokio::fs::copy(&media.0, &dest)
                .await
                .map_err(|e| Error::Media(format!("copy {}: {e}", media.0)))?;
        }

        debug!(item_id, path = %dest.display(), "staged media");
        Ok(staged)
    }
}

fn media_extension(media: &MediaRef) -> String {
    let without_query = media.0.split(['?', '#']).next().unwrap_or("");
    let name = without_query.rsplit('/').next().unwrap_or("");
    match name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        PathBuf::from(format!("/tmp/{prefix}-{}-{ts}", std::process::id()))
    }

    #[test]
    fn extension_from_path_or_url() {
        assert_eq!(media_extension(&MediaRef("a/b/pic.PNG".into())), "png");
        assert_eq!(
            media_extension(&MediaRef("https://x.io/p/img.webp?sz=2".into())),
            "webp"
        );
        assert_eq!(media_extension(&MediaRef("https://x.io/p/img".into())), "jpg");
        assert_eq!(media_extension(&MediaRef("weird.ext/../x".into())), "jpg");
    }

    #[test]
    fn dropping_the_guard_deletes_the_file() {
        let dir = tmp_dir("relay-media-drop");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("photo_1.jpg");
        std::fs::write(&path, b"img").unwrap();

        {
            let _staged = StagedMedia::new(&path);
        }
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn release_of_missing_file_is_ok() {
        let staged = StagedMedia::new("/tmp/relay-media-never-created.jpg");
        assert!(staged.release().is_ok());
    }

    #[tokio::test]
    async fn stages_local_file_into_temp_dir() {
        let src_dir = tmp_dir("relay-media-src");
        std::fs::create_dir_all(&src_dir).unwrap();
        let src = src_dir.join("pic.png");
        std::fs::write(&src, b"png-bytes").unwrap();

        let temp = tmp_dir("relay-media-tmp");
        let stager = FileMediaStager::new(&temp, Duration::from_secs(5)).unwrap();
        let staged = stager
            .stage(42, &MediaRef(src.to_string_lossy().to_string()))
            .await
            .unwrap();

        assert_eq!(staged.path(), temp.join("photo_42.png"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"png-bytes");

        let staged_path = staged.path().to_path_buf();
        staged.release().unwrap();
        assert!(!staged_path.exists());

        let _ = std::fs::remove_dir_all(&src_dir);
        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn missing_local_source_is_a_media_error() {
        let temp = tmp_dir("relay-media-missing");
        let stager = FileMediaStager::new(&temp, Duration::from_secs(5)).unwrap();
        let err = stager
            .stage(7, &MediaRef("/tmp/relay-no-such-source.jpg".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Media(_)));
        assert!(!temp.join("photo_7.jpg").exists());
        let _ = std::fs::remove_dir_all(&temp);
    }
}
