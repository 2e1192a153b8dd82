//! Process exit codes used by the `gitfleet` binary.
//!
//! - `0`: every command succeeded
//! - `1`: a fatal input or runtime error (e.g. an unresolvable target)
//! - `2`: invalid command-line usage (reported by clap)
//! - `3`: nothing to do; no repositories found or all were filtered out
//!
//! When any per-target command fails, the process exits with the code of the
//! last failure observed, clamped by [`clamp`].

/// Everything succeeded.
pub const SUCCESS: u8 = 0;

/// Fatal error before or outside per-target processing.
pub const ERROR: u8 = 1;

/// Command-line usage error; clap exits with this code on its own.
pub const USAGE: u8 = 2;

/// No repositories found, or all of them were filtered out.
pub const NOTHING_TO_DO: u8 = 3;

/// Map a raw command exit code into a valid, non-zero process exit code.
///
/// Codes outside `1..=255` (negative errno values, codes above 255) collapse
/// to [`ERROR`] so a failure is never reported as success.
pub fn clamp(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(0) | Err(_) => ERROR,
        Ok(code) => code,
    }
}
