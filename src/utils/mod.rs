pub mod format;
pub mod logging;

pub use format::{format_attempts, format_clock};
pub use logging::truncate_text;
