//! Header image loading.
//!
//! The image is fetched once at startup on a background task. Its progress is
//! published through a `watch` channel so declaration requests can check (or
//! briefly wait for) readiness instead of stalling on a missing image.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HeaderImageError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not compress image: {0}")]
    Compress(std::io::Error),

    #[error("image task aborted: {0}")]
    Task(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Decoded image
// ────────────────────────────────────────────────────────────────────────────

/// An RGB image ready to be embedded as a PDF image XObject.
#[derive(Debug)]
pub struct HeaderImage {
    pub width: u32,
    pub height: u32,
    /// 8-bit RGB samples, zlib-compressed (`/FlateDecode`).
    pub data: Vec<u8>,
}

impl HeaderImage {
    /// Decodes PNG/JPEG bytes. Transparency is flattened onto white, since
    /// the page background is white and `/DeviceRGB` carries no alpha.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            let alpha = a as u16;
            for channel in [r, g, b] {
                let blended = (channel as u16 * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&rgb)
            .map_err(HeaderImageError::Compress)?;
        let data = encoder.finish().map_err(HeaderImageError::Compress)?;

        Ok(Self {
            width,
            height,
            data,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sources
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self) -> Result<Bytes, HeaderImageError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn fetch(&self) -> Result<Bytes, HeaderImageError> {
        tokio::fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|source| HeaderImageError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpImageSource {
    client: reqwest::Client,
    url: String,
}

impl HttpImageSource {
    pub fn new(url: impl Into<String>) -> Result<Self, HeaderImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<Bytes, HeaderImageError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HeaderImageError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        Ok(response.bytes().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Picks the source kind from the configured location.
pub fn source_from_location(location: &str) -> Result<Arc<dyn ImageSource>, HeaderImageError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpImageSource::new(location)?))
    } else {
        Ok(Arc::new(FileImageSource::new(location)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loader task and handle
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum HeaderImageStatus {
    Loading,
    Ready(Arc<HeaderImage>),
    Failed(String),
}

/// Read side of the loader task. Cheap to clone into every request.
#[derive(Clone)]
pub struct HeaderImageHandle {
    rx: watch::Receiver<HeaderImageStatus>,
}

impl HeaderImageHandle {
    /// Spawns the fetch + decode task and returns immediately.
    pub fn spawn(source: Arc<dyn ImageSource>) -> Self {
        let (tx, rx) = watch::channel(HeaderImageStatus::Loading);
        tokio::spawn(async move {
            let location = source.describe();
            let status = match load(source.as_ref()).await {
                Ok(image) => {
                    info!(
                        "Header image loaded from {location} ({}x{})",
                        image.width, image.height
                    );
                    HeaderImageStatus::Ready(Arc::new(image))
                }
                Err(e) => {
                    warn!("Header image from {location} failed to load: {e}");
                    HeaderImageStatus::Failed(e.to_string())
                }
            };
            // Receivers may all be gone at shutdown; nothing to report then.
            let _ = tx.send(status);
        });
        Self { rx }
    }

    /// A handle whose status never changes.
    #[cfg(test)]
    pub fn fixed(status: HeaderImageStatus) -> Self {
        let (_tx, rx) = watch::channel(status);
        Self { rx }
    }

    pub fn status(&self) -> HeaderImageStatus {
        self.rx.borrow().clone()
    }

    /// Waits up to `timeout` for the status to leave `Loading`, then returns
    /// whatever it is at that point.
    pub async fn wait(&self, timeout: Duration) -> HeaderImageStatus {
        let mut rx = self.rx.clone();
        let settled = rx.wait_for(|s| !matches!(s, HeaderImageStatus::Loading));
        let status = match tokio::time::timeout(timeout, settled).await {
            Ok(Ok(status)) => (*status).clone(),
            _ => self.status(),
        };
        status
    }
}

async fn load(source: &dyn ImageSource) -> Result<HeaderImage, HeaderImageError> {
    let bytes = source.fetch().await?;
    tokio::task::spawn_blocking(move || HeaderImage::decode(&bytes))
        .await
        .map_err(|e| HeaderImageError::Task(e.to_string()))?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbaImage::new(width, height);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    struct FailingSource;

    #[async_trait]
    impl ImageSource for FailingSource {
        async fn fetch(&self) -> Result<Bytes, HeaderImageError> {
            Err(HeaderImageError::Task("boom".into()))
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    #[test]
    fn test_decode_flattens_alpha_onto_white() {
        let image = HeaderImage::decode(&png_bytes(2, 1)).unwrap();
        assert_eq!((image.width, image.height), (2, 1));

        let mut decoder = flate2::read::ZlibDecoder::new(image.data.as_slice());
        let mut rgb = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut rgb).unwrap();
        // opaque red, then a fully transparent pixel that must come out white
        assert_eq!(rgb, [255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            HeaderImage::decode(b"not an image"),
            Err(HeaderImageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_file_source_becomes_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.png");
        std::fs::write(&path, png_bytes(4, 2)).unwrap();

        let handle = HeaderImageHandle::spawn(Arc::new(FileImageSource::new(&path)));
        match handle.wait(Duration::from_secs(5)).await {
            HeaderImageStatus::Ready(img) => assert_eq!((img.width, img.height), (4, 2)),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_fails_instead_of_stalling() {
        let handle = HeaderImageHandle::spawn(Arc::new(FileImageSource::new(
            "/definitely/not/here.png",
        )));
        assert!(matches!(
            handle.wait(Duration::from_secs(5)).await,
            HeaderImageStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_failing_source_reports_error_text() {
        let handle = HeaderImageHandle::spawn(Arc::new(FailingSource));
        match handle.wait(Duration::from_secs(5)).await {
            HeaderImageStatus::Failed(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wait_times_out_while_loading() {
        let handle = HeaderImageHandle::fixed(HeaderImageStatus::Loading);
        assert!(matches!(
            handle.wait(Duration::from_millis(20)).await,
            HeaderImageStatus::Loading
        ));
    }

    #[tokio::test]
    async fn test_wait_hands_back_a_settled_status() {
        let handle = HeaderImageHandle::fixed(HeaderImageStatus::Failed("gone".into()));
        let started = std::time::Instant::now();
        match handle.wait(Duration::from_secs(30)).await {
            HeaderImageStatus::Failed(msg) => assert_eq!(msg, "gone"),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        // the handle stays usable after a wait
        assert!(matches!(handle.status(), HeaderImageStatus::Failed(_)));
    }

    #[test]
    fn test_source_from_location_picks_kind() {
        assert_eq!(
            source_from_location("assets/header.png").unwrap().describe(),
            "assets/header.png"
        );
        assert_eq!(
            source_from_location("https://example.com/h.png").unwrap().describe(),
            "https://example.com/h.png"
        );
    }
}
