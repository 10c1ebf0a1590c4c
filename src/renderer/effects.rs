// Clip, opacity and transform effects applied around painting phases
use tracing::trace;

use super::path::closed_path;
use crate::canvas::Canvas;
use crate::tree::{Effect, EffectKind};

/// Effects currently applied to the canvas, plus the global alpha stack.
///
/// Every applied effect owns exactly one canvas save; unwinding an effect
/// restores it and pops its alpha entry when it was an opacity.
#[derive(Debug)]
pub struct EffectStack {
    active: Vec<Effect>,
    alpha: Vec<f32>,
}

impl Default for EffectStack {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectStack {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            alpha: vec![1.0],
        }
    }

    /// Alpha multiplier for every resolved paint color
    pub fn global_alpha(&self) -> f32 {
        self.alpha.last().copied().unwrap_or(1.0)
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }

    pub fn alpha_depth(&self) -> usize {
        self.alpha.len()
    }

    /// Unwind every active effect, then apply `requested` in order
    pub fn apply_effects(&mut self, canvas: &mut dyn Canvas, requested: &[Effect]) {
        while !self.active.is_empty() {
            self.pop_effect(canvas);
        }
        for effect in requested {
            self.apply_effect(canvas, effect);
        }
    }

    fn apply_effect(&mut self, canvas: &mut dyn Canvas, effect: &Effect) {
        canvas.save();
        match &effect.kind {
            EffectKind::Opacity(value) => {
                let alpha = self.global_alpha() * value;
                trace!("push opacity {} -> {}", value, alpha);
                self.alpha.push(alpha);
            }
            EffectKind::Transform { matrix, origin } => {
                let pivot = origin.to_vec2();
                canvas.translate(pivot);
                canvas.concat(*matrix);
                canvas.translate(-pivot);
            }
            EffectKind::Clip(segments) => {
                canvas.clip_path(&closed_path(segments), true);
            }
        }
        self.active.push(effect.clone());
    }

    fn pop_effect(&mut self, canvas: &mut dyn Canvas) {
        if let Some(effect) = self.active.pop() {
            if matches!(effect.kind, EffectKind::Opacity(_)) {
                self.alpha.pop();
            }
            canvas.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};
    use crate::tree::{EffectTarget, PathSegment};
    use kurbo::{Affine, Point, Size};

    fn clip() -> Effect {
        Effect::clip(
            vec![
                PathSegment::Vertex(Point::new(0.0, 0.0)),
                PathSegment::Vertex(Point::new(10.0, 0.0)),
                PathSegment::Vertex(Point::new(10.0, 10.0)),
            ],
            EffectTarget::all(),
        )
    }

    #[test]
    fn stack_length_matches_request() {
        let mut canvas = DisplayList::new(Size::new(100.0, 100.0));
        let mut stack = EffectStack::new();
        stack.apply_effects(&mut canvas, &[Effect::opacity(0.5), clip(), Effect::opacity(0.5)]);
        assert_eq!(stack.depth(), 3);
        assert_eq!(canvas.save_count(), 3);
        assert!((stack.global_alpha() - 0.25).abs() < 1e-6);

        stack.apply_effects(&mut canvas, &[clip()]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.alpha_depth(), 1);
        assert_eq!(stack.global_alpha(), 1.0);
    }

    #[test]
    fn empty_flush_is_idempotent() {
        let mut canvas = DisplayList::new(Size::new(100.0, 100.0));
        let mut stack = EffectStack::new();
        stack.apply_effects(&mut canvas, &[Effect::opacity(0.3), clip()]);
        stack.apply_effects(&mut canvas, &[]);
        stack.apply_effects(&mut canvas, &[]);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.alpha_depth(), 1);
        assert_eq!(canvas.save_count(), 0);
    }

    #[test]
    fn transform_pivots_around_origin() {
        let mut canvas = DisplayList::new(Size::new(100.0, 100.0));
        let mut stack = EffectStack::new();
        let effect = Effect::transform(Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]), Point::new(5.0, 5.0));
        stack.apply_effects(&mut canvas, &[effect]);

        let concats: Vec<Affine> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Concat(affine) => Some(*affine),
                _ => None,
            })
            .collect();
        assert_eq!(concats.len(), 3);
        assert_eq!(concats[0], Affine::translate((5.0, 5.0)));
        assert_eq!(concats[2], Affine::translate((-5.0, -5.0)));
    }
}
