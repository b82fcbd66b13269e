pub mod loaders;
pub mod selectors;
pub mod timings;

pub use loaders::{is_image_file, load_image_batch};
pub use selectors::Selectors;
pub use timings::{JitterRange, Timings};
