#![forbid(unsafe_code)]

mod output;

pub use output::{init_tracing, save_png, save_thumbnails};
