pub mod banner_overlay_renderer;
