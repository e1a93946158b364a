//! Vizora Clock Infrastructure
//!
//! Provides time sources behind the [`Clock`] port:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time that only moves when told to, for
//!   deterministic expiry and heartbeat-timeout tests
//!
//! ## Usage
//!
//! ```ignore
//! use vizora_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::starting_now();
//! let t0 = clock.now();
//! clock.advance(Duration::seconds(45));
//! assert_eq!(clock.now() - t0, Duration::seconds(45));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use vizora_ports::Clock;
