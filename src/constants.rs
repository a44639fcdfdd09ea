// src/constants.rs

use std::time::Duration;

/// The name of the per-user data directory holding all chaintool state.
pub const DATA_DIR_NAME: &str = "chaintool";

/// Environment variable that overrides the data directory location.
pub const DATA_DIR_ENV_VAR: &str = "CHAINTOOL_DATA_DIR";

/// Subdirectory (inside the data dir) holding command documents.
pub const CMD_SUBDIR: &str = "commands";

/// Subdirectory (inside the data dir) holding sequence documents.
pub const SEQ_SUBDIR: &str = "sequences";

/// Subdirectory (inside the data dir) holding lock marker files.
pub const LOCKS_SUBDIR: &str = "locks";

/// Subdirectory (inside the data dir) holding generated shell alias scripts.
pub const SHORTCUTS_SUBDIR: &str = "shortcuts";

/// The file guarded by a classic blocking flock, used only to make the
/// lock-marker check-and-create step atomic across processes.
pub const META_LOCK_FILENAME: &str = "meta.lock";

/// Fixed backoff between lock acquisition retries.
pub const LOCK_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Schema version written into export files. Import refuses anything newer.
pub const EXPORT_SCHEMA_VERSION: u32 = 1;
