pub mod filename;
pub mod filesystem;

pub use filename::{sanitize_filename, target_filename};
pub use filesystem::FileStorage;
