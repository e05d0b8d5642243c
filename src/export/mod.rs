//! Export of generated texture buffers to image files.

mod png;

pub use png::{export_rgba_png, export_texture_set_png, PngExportError, PngExportOptions};
