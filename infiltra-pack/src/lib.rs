pub mod chip;
mod config;
mod error;
pub mod image;
mod merger;
pub mod process;
pub mod targets;

pub use config::{absolute, BuildConfig, Config};
pub use error::Error;
pub use merger::{MergeCommand, Merger};
