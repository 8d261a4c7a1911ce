//! Process exit codes for `bagit`.
//! These codes are part of the public contract and stay stable across releases.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_BAG_FAILED: i32 = 1; // A bag failed validation or could not be created
pub const EXIT_CONFIG_ERROR: i32 = 2; // Bad flags, unreadable config, logging setup failed
