// Unit tests for logger initialization

use crate::error::LoggerError;
use crate::logger::initialize;

use std::path::PathBuf;

/// **VALUE**: Verifies that an unwritable log directory returns an error instead of panicking.
///
/// **WHY THIS MATTERS**: Hosts call this during startup. A panic there takes the
/// whole host down over a logging problem.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped.
#[test]
fn given_invalid_log_dir_when_initialize_called_then_returns_error() {
    // GIVEN: A path that cannot hold a file
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Initializing
    let result = initialize(&invalid_dir);

    // THEN: An initialize error comes back
    assert!(matches!(result, Err(LoggerError::Initialize { .. })));
}
