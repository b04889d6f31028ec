//! Process exit codes for `runledger`. Part of the CLI contract.

use runledger_core::LedgerError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Store, decode or I/O failure
pub const EXIT_USAGE: i32 = 2; // Conflicting flags or bad config

pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LedgerError>() {
        Some(e) if e.is_usage() => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
