#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod editor;
pub mod highlight;
pub mod snippet;
pub mod storage;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
