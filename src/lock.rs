//! # Cross-Core Lock
//!
//! Mutual exclusion over the thread table and current-thread array.
//!
//! Disabling local interrupts (the usual single-core critical-section
//! trick) is not enough here: it only stops the *local* core from
//! preempting itself, and says nothing about the other core, which can run
//! the exact same scheduling code at the exact same instant. The only thing
//! that actually orders accesses from both cores is a hardware primitive
//! both cores observe — the RP2040's SIO spinlock block.
//!
//! This lock must never be held across a `wfi` or across the second half
//! of the context-switch trampoline: holding it there would starve the
//! other core out of ever completing a reschedule.

use crate::config::SCHEDULER_SPINLOCK;
use rp2040_hal::sio::Spinlock;

/// The single hardware spinlock guarding every mutation of the thread
/// table. Reserved the way the original firmware reserves
/// `PICO_SPINLOCK_ID_OS1` — a high index the SDK/HAL don't otherwise claim.
pub type SchedulerLock = Spinlock<SCHEDULER_SPINLOCK>;

/// Acquire the scheduler lock, busy-waiting until it's free. The returned
/// guard releases the lock on drop.
///
/// # Safety
/// Callers must not call this reentrantly on the same core — the
/// underlying hardware spinlock is not recursive and a second `claim()`
/// from the holder would deadlock against itself.
#[inline]
pub fn acquire() -> SchedulerLock {
    SchedulerLock::claim()
}
