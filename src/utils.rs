//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::{
    check_no_operation_in_progress, check_nothing_staged, check_working_directory_clean,
};
pub use settings::Settings;
