//! Exit code constants for the qualforge CLI.
//!
//! - 0: Success, every generator produced its artifacts
//! - 1: User error (bad args, invalid config, rejected pipeline plan)
//! - 2: Generation aborted by a critical generator failure
//! - 3: Generation completed with optional gaps
//! - 4: Run cancelled before completion

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or a rejected plan.
pub const USER_ERROR: i32 = 1;

/// A critical generator failed and the pipeline aborted.
pub const GENERATION_ABORTED: i32 = 2;

/// The pipeline finished but one or more optional generators failed.
pub const INCOMPLETE: i32 = 3;

/// The run was cancelled (e.g., Ctrl-C) before it finished.
pub const CANCELLED: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, GENERATION_ABORTED, INCOMPLETE, CANCELLED];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
