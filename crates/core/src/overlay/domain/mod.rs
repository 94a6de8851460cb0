pub mod overlay_content;
pub mod overlay_renderer;
