//! # Structured Logging
//!
//! A one-name indirection over `defmt` so the rest of the kernel never names
//! `defmt` directly, and so logging can be compiled out entirely rather than
//! dragging `defmt-rtt` (and the RTT buffer lock it needs) into builds that
//! don't want it — host-side `#[cfg(test)]` runs chief among them. Gated
//! behind the `klog` feature, default-on, the same way `led`'s activity hook
//! is gated behind `status-led`.
//!
//! Call sites elsewhere in the crate use `crate::klog::debug!(...)` etc.,
//! never `defmt::debug!` directly.

#[cfg(feature = "klog")]
pub use defmt::{debug, error, info, trace, warn};

#[cfg(not(feature = "klog"))]
pub use noop::{debug, error, info, trace, warn};

#[cfg(not(feature = "klog"))]
mod noop {
    /// Swallows its arguments; exists only so every `klog::LEVEL!(...)` call
    /// site compiles identically whether or not `klog` is enabled.
    macro_rules! noop_log {
        ($($arg:tt)*) => {};
    }

    pub(crate) use noop_log as debug;
    pub(crate) use noop_log as error;
    pub(crate) use noop_log as info;
    pub(crate) use noop_log as trace;
    pub(crate) use noop_log as warn;
}
