// Image and SVG resources: loading, decoding and caching
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use data_url::DataUrl;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use image::imageops::FilterType;
use peniko::{Blob, ImageAlphaType};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("file read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("svg parse error: {0}")]
    Svg(#[from] usvg::Error),
    #[error("invalid data url: {0}")]
    DataUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("resource failed to load earlier: {0}")]
    PreviouslyFailed(String),
}

/// Decoded RGBA8 pixels
#[derive(Clone, Debug)]
pub struct RasterImageData {
    pub width: u32,
    pub height: u32,
    pub data: Blob<u8>,
    pub alpha_type: ImageAlphaType,
}

impl RasterImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, alpha_type: ImageAlphaType) -> Self {
        Self {
            width,
            height,
            data: Blob::new(Arc::new(pixels)),
            alpha_type,
        }
    }

    /// Resample to a new size with a bicubic (Catmull-Rom) filter
    pub fn resized(&self, width: u32, height: u32) -> Option<RasterImageData> {
        if width == 0 || height == 0 {
            return None;
        }
        if width == self.width && height == self.height {
            return Some(self.clone());
        }
        let source = image::RgbaImage::from_raw(self.width, self.height, self.data.data().to_vec())?;
        let scaled = image::imageops::resize(&source, width, height, FilterType::CatmullRom);
        Some(RasterImageData::new(width, height, scaled.into_raw(), self.alpha_type))
    }
}

/// A fetched and decoded resource
#[derive(Clone, Debug)]
pub enum Resource {
    Image(Arc<RasterImageData>),
    Svg(Arc<usvg::Tree>),
}

impl Resource {
    pub fn intrinsic_size(&self) -> (f64, f64) {
        match self {
            Resource::Image(image) => (image.width as f64, image.height as f64),
            Resource::Svg(tree) => {
                let size = tree.size();
                (size.width() as f64, size.height() as f64)
            }
        }
    }

    /// Pixels at the requested size; SVGs are rasterized, bitmaps resampled
    pub fn to_raster(&self, width: u32, height: u32) -> Option<Arc<RasterImageData>> {
        match self {
            Resource::Image(image) if image.width == width && image.height == height => Some(Arc::clone(image)),
            Resource::Image(image) => image.resized(width, height).map(Arc::new),
            Resource::Svg(tree) => rasterize_svg(tree, width, height).map(Arc::new),
        }
    }
}

/// Source of decoded images for the painter
pub trait ResourceCache {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Resource, ResourceError>>;
}

pub(crate) static FONT_DB: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

pub(crate) fn parse_svg(source: &[u8]) -> Result<usvg::Tree, usvg::Error> {
    let options = usvg::Options {
        fontdb: Arc::clone(&*FONT_DB),
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(source, &options)?;
    Ok(tree)
}

/// Render an SVG tree into premultiplied pixels
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> Option<RasterImageData> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)?;
    let size = tree.size();
    let transform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());
    Some(RasterImageData::new(width, height, pixmap.take(), ImageAlphaType::AlphaPremultiplied))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Decode raw bytes into a resource, sniffing SVG from the mime type or content
fn decode(bytes: &[u8], is_svg: bool) -> Result<Resource, ResourceError> {
    if is_svg || looks_like_svg(bytes) {
        return Ok(Resource::Svg(Arc::new(parse_svg(bytes)?)));
    }

    let image = image::load_from_memory(bytes)?;
    let rgba_image = image.to_rgba8();
    let (width, height) = rgba_image.dimensions();
    Ok(Resource::Image(Arc::new(RasterImageData::new(
        width,
        height,
        rgba_image.into_raw(),
        ImageAlphaType::Alpha,
    ))))
}

fn decode_data_url(url: &str) -> Result<Resource, ResourceError> {
    let data_url = DataUrl::process(url).map_err(|e| ResourceError::DataUrl(format!("{:?}", e)))?;
    let is_svg = data_url.mime_type().subtype.contains("svg");
    let (bytes, _) = data_url
        .decode_to_vec()
        .map_err(|e| ResourceError::DataUrl(format!("{:?}", e)))?;
    decode(&bytes, is_svg)
}

/// Resource cache reading local files and `data:` urls.
///
/// Results are kept for the lifetime of the cache, failures included, so a
/// broken image referenced by many elements is only attempted once.
pub struct FileResourceCache {
    base_dir: PathBuf,
    cache: RefCell<HashMap<String, Option<Resource>>>,
}

impl FileResourceCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn resolve_path(&self, url: &str) -> Result<PathBuf, ResourceError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(ResourceError::UnsupportedScheme(scheme.to_string()));
        }
        let path = Path::new(url);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir.join(path))
        }
    }

    async fn load(&self, url: &str) -> Result<Resource, ResourceError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let path = self.resolve_path(url)?;
        debug!("Reading local resource: {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        decode(&bytes, is_svg)
    }
}

impl ResourceCache for FileResourceCache {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Resource, ResourceError>> {
        async move {
            // Check cache first
            if let Some(cached) = self.cache.borrow().get(url) {
                return cached
                    .clone()
                    .ok_or_else(|| ResourceError::PreviouslyFailed(url.to_string()));
            }

            let result = self.load(url).await;
            if let Err(err) = &result {
                warn!("Failed to load resource {}: {}", truncate_url(url), err);
            }
            self.cache
                .borrow_mut()
                .insert(url.to_string(), result.as_ref().ok().cloned());
            result
        }
        .boxed_local()
    }
}

/// Data urls can be huge; keep log lines short
fn truncate_url(url: &str) -> &str {
    match url.char_indices().nth(64) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";
    const SQUARE_SVG: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='4' height='2'%3E%3Crect width='4' height='2' fill='blue'/%3E%3C/svg%3E";

    #[test]
    fn decodes_png_data_url() {
        let cache = FileResourceCache::new(".");
        let resource = futures::executor::block_on(cache.fetch(RED_PIXEL_PNG)).unwrap();
        assert_eq!(resource.intrinsic_size(), (1.0, 1.0));
    }

    #[test]
    fn svg_data_url_rasterizes_at_requested_size() {
        let cache = FileResourceCache::new(".");
        let resource = futures::executor::block_on(cache.fetch(SQUARE_SVG)).unwrap();
        assert_eq!(resource.intrinsic_size(), (4.0, 2.0));
        let raster = resource.to_raster(8, 4).unwrap();
        assert_eq!((raster.width, raster.height), (8, 4));
        assert_eq!(raster.alpha_type, ImageAlphaType::AlphaPremultiplied);
    }

    #[test]
    fn remote_urls_are_rejected() {
        let cache = FileResourceCache::new(".");
        let result = futures::executor::block_on(cache.fetch("https://example.com/a.png"));
        assert!(matches!(result, Err(ResourceError::UnsupportedScheme(_))));
        // second attempt comes from the cache
        let again = futures::executor::block_on(cache.fetch("https://example.com/a.png"));
        assert!(matches!(again, Err(ResourceError::PreviouslyFailed(_))));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let cache = FileResourceCache::new(std::env::temp_dir());
        let result = cache.fetch("does-not-exist-stokes-print.png").await;
        assert!(matches!(result, Err(ResourceError::Io(_))));
    }
}
