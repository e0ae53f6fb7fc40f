//! Constants for the download module (timeouts).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout between body reads (5 minutes for slow media hosts).
pub const READ_TIMEOUT_SECS: u64 = 300;
