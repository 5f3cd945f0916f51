mod commands;
mod fs;
mod home;
mod paths;

pub use commands::HideWindow;
pub use fs::write_atomic;
pub use home::expand_home;
pub use paths::{AppPaths, AppPathsError};
