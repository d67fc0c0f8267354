// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod context;
pub mod grader;
pub mod history;
pub mod markup;
pub mod quiz;
pub mod results;
pub mod runtime;
pub mod samples;
pub mod session;
pub mod shuffle;
pub mod storage;
pub mod timer;
pub mod ui;

pub use app::{App, Screen};
