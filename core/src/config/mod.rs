pub mod load;
pub mod types;

pub use load::{apply_env_overrides, apply_overrides, load_default, load_from_path};
pub use types::*;
