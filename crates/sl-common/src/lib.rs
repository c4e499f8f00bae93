//! Shortlink Common
//!
//! Infrastructure shared by every Shortlink service: structured logging
//! setup and the wall-clock abstraction used wherever time decides an outcome
//! (token expiry, lookup-failure timestamps).

pub mod clock;
pub mod logging;

pub use clock::{Clock, FixedClock, SystemClock};
