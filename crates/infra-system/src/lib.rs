// FocusBlox Infrastructure - System Adapters
// Implements: append-only debug log file

pub mod debug_log;

pub use debug_log::{DebugLog, DEBUG_LOG_FILE_NAME, NO_LOGS_MESSAGE};
