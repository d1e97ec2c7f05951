//! # Kernel Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time — no dynamic allocation.

/// Number of processor cores this kernel drives. The RP2040 has two.
pub const CORES: usize = 2;

/// Number of user-registrable thread slots, on top of the per-core idle
/// threads. Bounds the static thread-table array.
pub const USER_THREADS: usize = 8;

/// Total thread-table size: one idle descriptor per core plus the user pool.
pub const MAX_THREADS: usize = CORES + USER_THREADS;

/// Scheduler tick period in microseconds. Each core's SysTick is programmed
/// to fire at this interval; the reload value is derived at runtime from the
/// actual system clock frequency (see `arch::cortex_m0::configure_systick`).
pub const SCHEDULER_INTERVAL_US: u32 = 10_000;

/// Word count reserved for each idle thread's stack. The idle body is just
/// a `wfi` loop, so this only needs to cover the synthetic exception frame.
pub const IDLE_STACK_WORDS: usize = 100;

/// Sentinel pid returned by `kernel::register` when the user pool is full.
pub const INVALID_PID: u8 = u8::MAX;

/// Hardware spinlock index reserved for the scheduler's cross-core lock.
/// Chosen high in the range the same way the original reserves
/// `PICO_SPINLOCK_ID_OS1`, away from spinlocks the SDK/HAL claim for its own
/// bookkeeping.
pub const SCHEDULER_SPINLOCK: usize = 31;
