//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_amount, format_date, format_optional, format_phone, initials, truncate_string};
