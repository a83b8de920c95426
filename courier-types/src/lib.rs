//! Courier Types
//!
//! Shared records for the notification pipeline: the queued notification,
//! the producer-side email configuration, and the SMTP transport snapshot
//! resolved for every dispatch cycle.

pub mod schemas;
pub mod transport;
pub mod error;

pub use schemas::*;
pub use transport::*;
pub use error::*;
