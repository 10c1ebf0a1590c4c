// Page renderer - walks a stacking-context tree in CSS painting order
pub mod background;
pub mod border;
pub mod content;
pub mod effects;
pub mod font;
pub mod gradient;
pub mod paint;
pub mod path;
pub mod shadow;
pub mod text;

use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use kurbo::{Affine, Size};
use tracing::{debug, trace};

use crate::canvas::font::FontCollection;
use crate::canvas::{Brush, Canvas, DisplayList};
use crate::resource::ResourceCache;
use crate::tree::{ContentKind, EffectTarget, ElementPaint, StackingContext};
use effects::EffectStack;
use paint::{is_transparent, resolve_color};

/// Paints one stacking-context tree onto a canvas.
///
/// A renderer owns its effect stack, so a page (or an iframe inside it) is
/// painted by exactly one renderer, one node at a time.
pub struct PageRenderer<'a> {
    canvas: &'a mut dyn Canvas,
    fonts: &'a dyn FontCollection,
    resources: &'a dyn ResourceCache,
    background_color: Option<String>,
    effects: EffectStack,
}

impl<'a> PageRenderer<'a> {
    pub fn new(canvas: &'a mut dyn Canvas, fonts: &'a dyn FontCollection, resources: &'a dyn ResourceCache) -> Self {
        Self {
            canvas,
            fonts,
            resources,
            background_color: None,
            effects: EffectStack::new(),
        }
    }

    /// Color painted over the whole canvas before the tree
    pub fn with_background(mut self, color: Option<String>) -> Self {
        self.background_color = color;
        self
    }

    pub fn effect_depth(&self) -> usize {
        self.effects.depth()
    }

    /// Paint `root` and unwind every effect afterwards
    pub async fn render(&mut self, root: &StackingContext) {
        if let Some(color) = self.background_color.as_deref().filter(|color| !is_transparent(color)) {
            let rect = self.canvas.size().to_rect();
            self.canvas.draw_rect(rect, &Brush::solid(resolve_color(color)));
        }
        self.render_stack(root).await;
        self.effects.apply_effects(&mut *self.canvas, &[]);
    }

    fn render_stack<'s>(&'s mut self, stack: &'s StackingContext) -> LocalBoxFuture<'s, ()> {
        async move {
            if !stack.element.visible {
                trace!("skipping invisible stacking context {:?}", stack.element.id);
                return;
            }

            self.render_node_background_and_borders(&stack.element).await;

            for child in &stack.negative_z_index {
                self.render_stack(child).await;
            }

            self.render_node_content(&stack.element).await;

            for node in &stack.non_inline_level {
                self.render_node(node).await;
            }
            for child in &stack.non_positioned_floats {
                self.render_stack(child).await;
            }
            for child in &stack.non_positioned_inline_level {
                self.render_stack(child).await;
            }
            for node in &stack.inline_level {
                self.render_node(node).await;
            }
            for child in &stack.zero_or_auto_z_index_or_transformed_or_opacity {
                self.render_stack(child).await;
            }
            for child in &stack.positive_z_index {
                self.render_stack(child).await;
            }
        }
        .boxed_local()
    }

    async fn render_node(&mut self, element: &ElementPaint) {
        if !element.visible {
            return;
        }
        self.render_node_background_and_borders(element).await;
        self.render_node_content(element).await;
    }

    async fn render_node_background_and_borders(&mut self, element: &ElementPaint) {
        self.effects
            .apply_effects(&mut *self.canvas, &element.effects_for(EffectTarget::BACKGROUND_BORDERS));
        let alpha = self.effects.global_alpha();
        let styles = &element.styles;

        if styles.has_background() || !styles.box_shadows.is_empty() {
            background::render_background(&mut *self.canvas, element, self.resources, alpha).await;
            shadow::render_box_shadows(&mut *self.canvas, &element.geometry, &styles.box_shadows, alpha);
        }
        border::render_borders(&mut *self.canvas, &element.geometry, &styles.borders, alpha);
    }

    async fn render_node_content(&mut self, element: &ElementPaint) {
        self.effects
            .apply_effects(&mut *self.canvas, &element.effects_for(EffectTarget::CONTENT));
        let alpha = self.effects.global_alpha();
        debug!("painting content of {:?} (alpha {})", element.id, alpha);

        self.canvas.begin_tag(element.id, element.tag.as_deref());

        text::render_text_runs(&mut *self.canvas, self.fonts, &element.text_runs, &element.styles, alpha);

        match &element.content {
            Some(ContentKind::Image { src } | ContentKind::Canvas { src } | ContentKind::Svg { src }) => {
                content::render_replaced(&mut *self.canvas, &element.geometry, src, self.resources).await;
            }
            Some(ContentKind::Iframe { tree, viewport, background_color }) => {
                self.render_iframe(element, tree, *viewport, background_color.clone()).await;
            }
            Some(ContentKind::Checkbox { checked }) => {
                content::render_checkbox(&mut *self.canvas, &element.geometry, *checked, alpha);
            }
            Some(ContentKind::Radio { checked }) => {
                content::render_radio(&mut *self.canvas, &element.geometry, *checked, alpha);
            }
            Some(kind @ (ContentKind::TextInput { .. } | ContentKind::TextArea { .. } | ContentKind::Select { .. })) => {
                if let Some(value) = kind.text_value() {
                    content::render_input_value(&mut *self.canvas, self.fonts, element, value, alpha);
                }
            }
            None => {}
        }

        if let Some(marker) = &element.list_marker {
            content::render_list_marker(&mut *self.canvas, self.fonts, self.resources, element, marker, alpha).await;
        }

        self.canvas.end_tag();
    }

    /// Render an iframe document with its own renderer and composite the
    /// result over the iframe's content box
    async fn render_iframe(
        &mut self,
        element: &ElementPaint,
        tree: &StackingContext,
        viewport: Size,
        background_color: Option<String>,
    ) {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        debug!("rendering iframe {:?} at {}x{}", element.id, viewport.width, viewport.height);

        let mut recording = DisplayList::new(viewport);
        {
            let mut renderer =
                PageRenderer::new(&mut recording, self.fonts, self.resources).with_background(background_color);
            renderer.render(tree).await;
        }
        let picture = Arc::new(recording.finish());

        let dest = element.geometry.content_rect;
        let transform = Affine::translate(dest.origin().to_vec2())
            * Affine::scale_non_uniform(dest.width() / viewport.width, dest.height() / viewport.height);
        self.canvas.draw_picture(&picture, transform);
    }
}
