//! Server clock synchronisation
//!
//! Viewers share no connection with each other. Each one polls a time
//! reference endpoint, keeps an offset between its local clock and the
//! server's, and derives the current simulation tick from that offset.

pub mod offset;
pub mod source;
pub mod sync;

pub use offset::{ClockOffset, SharedClockOffset};
pub use source::{HttpTimeSource, LocalClock, SystemClock, TimeReference, TimeSource};
pub use sync::{ClockSync, next_sync_delay};

/// Errors from a single synchronisation attempt.
///
/// None of these are fatal to a viewer: the previous offset stays in use and
/// the next attempt is scheduled as usual.
#[derive(Debug, thiserror::Error)]
pub enum ClockSyncError {
    #[error("Time reference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Time reference {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed time reference payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Invalid time reference URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
