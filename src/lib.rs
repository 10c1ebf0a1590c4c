// Paints laid-out stacking-context trees into paginated, tagged PDF
pub mod canvas;
pub mod config;
pub mod document;
pub mod renderer;
pub mod resource;
pub mod tree;

pub use config::RenderConfig;
pub use document::{DocumentError, PrintDocument};
pub use renderer::PageRenderer;
