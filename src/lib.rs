pub mod app;
pub mod color;
pub mod config;
pub mod diff;
pub mod frame;
pub mod help;
pub mod keys;
pub mod overlay;
pub mod pacing;
pub mod playback;
pub mod source;
pub mod telemetry;
pub mod terminal;
pub mod terminal_restore;
pub mod title;

pub use app::logging::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_file_path, log_panic,
    log_timing,
};
pub use telemetry::{init_tracing, tracing_log_path};
