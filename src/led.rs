//! # Activity Indicator
//!
//! Board bring-up — which pin drives an LED, how it's configured — is out
//! of scope for this crate. What the scheduler needs is just a signal it
//! can flip on reschedule and on idle entry/exit; the board layer decides
//! what, if anything, that drives.

/// A board-supplied hook the scheduler calls on activity transitions.
/// Registered once via `kernel::init`; if none is registered, these calls
/// are no-ops.
pub trait ActivityIndicator: Sync {
    /// Called once per reschedule that lands on a user thread.
    fn on_dispatch(&self, core: crate::thread::CoreId);

    /// Called when a core falls back to its idle thread.
    fn on_idle(&self, core: crate::thread::CoreId);
}
