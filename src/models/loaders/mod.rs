pub mod image_loader;

pub use image_loader::{is_image_file, load_image_batch};
