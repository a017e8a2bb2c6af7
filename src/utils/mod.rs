pub mod logging;
pub mod time;

// Re-export time utilities
pub use time::{current_time, format_time_left, time_until};

pub use logging::init_logger;
