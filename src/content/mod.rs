//! Note content transformation.

pub mod formatter;
pub mod images;

pub use formatter::strip_and_truncate;
pub use images::extract_image_urls;
