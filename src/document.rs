// Document driver: JSON page trees in, tagged PDF out
use std::path::Path;

use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Instrument, debug, debug_span, info};

use crate::canvas::font::FontCollection;
use crate::canvas::skia::{SkiaCanvas, SkiaFonts, to_structure_root};
use crate::canvas::{Canvas, DisplayList, Picture};
use crate::config::RenderConfig;
use crate::renderer::PageRenderer;
use crate::resource::ResourceCache;
use crate::tree::{StackingContext, StructureTree};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// A laid-out document: one stacking-context tree per page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrintDocument {
    #[serde(default)]
    pub config: RenderConfig,
    pub pages: Vec<StackingContext>,
}

impl PrintDocument {
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_json(&source)
    }

    fn checked_page_size(&self) -> Result<Size, DocumentError> {
        let size = self.config.page_size();
        if !(size.width > 0.0 && size.height > 0.0 && self.config.scale > 0.0) {
            return Err(DocumentError::Pdf(format!(
                "invalid page size {}x{} at scale {}",
                size.width, size.height, self.config.scale
            )));
        }
        Ok(size)
    }

    /// Paint every page into a recording instead of a PDF
    pub async fn record_pages(
        &self,
        fonts: &dyn FontCollection,
        resources: &dyn ResourceCache,
    ) -> Result<Vec<Picture>, DocumentError> {
        let size = self.checked_page_size()?;
        let mut pictures = Vec::with_capacity(self.pages.len());
        for (index, page) in self.pages.iter().enumerate() {
            let mut recording = DisplayList::new(size);
            {
                let mut renderer = PageRenderer::new(&mut recording, fonts, resources)
                    .with_background(self.config.background_color.clone());
                renderer.render(page).instrument(debug_span!("page", index)).await;
            }
            pictures.push(recording.finish());
        }
        Ok(pictures)
    }

    /// Paint every page into a PDF, returning the file bytes
    pub async fn render_pdf(&self, resources: &dyn ResourceCache) -> Result<Vec<u8>, DocumentError> {
        let size = self.checked_page_size()?;
        let scale = self.config.scale;
        let fonts = SkiaFonts::new(&self.config);
        let tags = StructureTree::build(&self.pages);
        debug!("structure tree with {} top-level elements", tags.roots.len());

        let metadata = skia_safe::pdf::Metadata {
            title: self.config.title.clone().unwrap_or_default(),
            creator: "stokes-print".to_string(),
            producer: "stokes-print".to_string(),
            structure_element_tree_root: to_structure_root(&tags),
            ..Default::default()
        };

        let mut out = Vec::new();
        {
            let mut document = skia_safe::pdf::new_document(&mut out, Some(&metadata));
            for (index, page) in self.pages.iter().enumerate() {
                let mut on_page = document.begin_page(
                    ((size.width * scale) as f32, (size.height * scale) as f32),
                    None,
                );
                {
                    let mut canvas =
                        SkiaCanvas::new(on_page.canvas(), &fonts, size).with_tag_ids(tags.page_ids(index));
                    canvas.scale(scale, scale);
                    let mut renderer = PageRenderer::new(&mut canvas, &fonts, resources)
                        .with_background(self.config.background_color.clone());
                    renderer.render(page).instrument(debug_span!("page", index)).await;
                }
                document = on_page.end_page();
            }
            document.close();
        }

        if out.is_empty() {
            return Err(DocumentError::Pdf("skia produced an empty document".to_string()));
        }
        info!("Rendered {} pages ({} bytes)", self.pages.len(), out.len());
        Ok(out)
    }

    pub async fn write_pdf(&self, resources: &dyn ResourceCache, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let bytes = self.render_pdf(resources).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
