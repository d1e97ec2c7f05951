//! # Error Types
//!
//! The kernel's three error kinds, named rather than left as bare sentinels,
//! in the idiom of `oxidecomputer-hubris`'s `err.rs` (small `#[derive(Debug)]`
//! enums, no `std::error::Error`, no heap):
//!
//! - *Capacity exhausted* stays a sentinel (`Pid::INVALID`), not a variant
//!   here — `register` is documented as "pid-or-invalid", not a
//!   `Result`-returning operation, and forcing a `Result` onto it would
//!   contradict that.
//! - *Thread fault* is never propagated (`ThreadState::Faulted` is contained
//!   entirely at the descriptor), so it has no variant either — there is
//!   nothing to return it from.
//! - *Configuration error* (misaligned/undersized stack) is undefined
//!   behavior by design, not a recoverable condition — also no variant.
//!
//! What *is* a genuine `Result`-shaped operation is reading back a
//! descriptor's state for postmortem inspection by a `Pid` a caller no
//! longer knows is still valid — `kernel::thread_state` uses this enum for
//! that one case.

/// Failure reading a thread's state by `Pid`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// The pid is `Pid::INVALID` or outside the thread table's range.
    InvalidPid,
}
