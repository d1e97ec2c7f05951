//! # Scheduler
//!
//! Owns the thread table and the per-core "who's running" array, and
//! implements the one scheduling policy this kernel has: round-robin among
//! runnable peers, with first-dispatch-wins affinity. There are no priority
//! levels — every user thread is scheduled identically regardless of when
//! or where it was registered.
//!
//! Every public method here assumes the caller already holds the scheduler
//! lock (`lock::acquire`); this module has no locking of its own.

use crate::config::{CORES, IDLE_STACK_WORDS, MAX_THREADS, USER_THREADS};
use crate::thread::{Affinity, CoreId, Pid, ThreadDescriptor, ThreadState};

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// Central scheduler state: the thread table plus one "currently running"
/// pid per core. Lives as a single static, initialized by `kernel::init`
/// before either core starts.
pub struct Scheduler {
    threads: [ThreadDescriptor; MAX_THREADS],
    idle_stacks: [[u32; IDLE_STACK_WORDS]; CORES],
    current: [Pid; CORES],
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            threads: [ThreadDescriptor::empty(); MAX_THREADS],
            idle_stacks: [[0u32; IDLE_STACK_WORDS]; CORES],
            current: [Pid::new(0), Pid::new(1)],
        }
    }

    /// Build the two permanently-runnable, pre-pinned idle descriptors.
    /// Must run once, before either core's first dispatch.
    pub fn init_idle(&mut self) {
        for core_index in 0..CORES {
            let core = if core_index == 0 { CoreId::Core0 } else { CoreId::Core1 };
            let sp = crate::thread::prepare_stack(&mut self.idle_stacks[core_index], idle_entry, idle_unreachable_exit);
            self.threads[core_index] = ThreadDescriptor {
                stack_pointer: sp,
                affinity: Affinity::Pinned(core),
                pid: Pid::new(core_index),
                state: ThreadState::Runnable,
            };
            self.current[core_index] = Pid::new(core_index);
        }
    }

    /// Claim the first free (or completed) user slot for a new thread.
    ///
    /// Returns the populated descriptor's own index — never a counter that
    /// has already moved past it — so a full table is unambiguously
    /// signalled by `Pid::INVALID` rather than an off-by-one value.
    pub fn register(
        &mut self,
        entry: extern "C" fn(),
        stack: &'static mut [u32],
        on_exit: extern "C" fn() -> !,
    ) -> Pid {
        for idx in CORES..MAX_THREADS {
            let free = matches!(self.threads[idx].state, ThreadState::Free | ThreadState::Done);
            if !free {
                continue;
            }
            let sp = crate::thread::prepare_stack(stack, entry, on_exit);
            self.threads[idx] = ThreadDescriptor {
                stack_pointer: sp,
                affinity: Affinity::Unpinned,
                pid: Pid::new(idx),
                state: ThreadState::Runnable,
            };
            return Pid::new(idx);
        }
        Pid::INVALID
    }

    /// The pid currently assigned to `core`.
    #[inline]
    pub fn current_pid(&self, core: CoreId) -> Pid {
        self.current[core.index()]
    }

    /// The saved stack pointer of whichever thread `core` is currently
    /// assigned. Used once per core at startup to cold-launch its first
    /// thread (always the idle thread).
    #[inline]
    pub fn current_stack_pointer(&self, core: CoreId) -> *mut u32 {
        self.threads[self.current[core.index()].index()].stack_pointer
    }

    /// Store the updated stack pointer for whichever thread `core` was
    /// running. Called from the trampoline's save half.
    pub fn save_stack_pointer(&mut self, core: CoreId, sp: *mut u32) {
        let idx = self.current[core.index()].index();
        self.threads[idx].stack_pointer = sp;
    }

    /// Select the next runnable thread for `core` and return its saved
    /// stack pointer. Updates `current[core]` and, on first dispatch, pins
    /// the winner to `core`.
    ///
    /// Scans the user pool starting at `(cur.pid - CORES + 1) mod
    /// USER_THREADS + CORES`, i.e. the slot after whatever this core was
    /// last running, wrapping around exactly once. Falls back to this
    /// core's idle thread if nothing else is eligible.
    pub fn schedule(&mut self, core: CoreId) -> *mut u32 {
        let cur = self.current[core.index()].index() as i32;
        let start = (cur - CORES as i32 + 1).rem_euclid(USER_THREADS as i32) as usize;

        for i in 0..USER_THREADS {
            let idx = CORES + (start + i) % USER_THREADS;
            let t = &mut self.threads[idx];
            if t.is_runnable() && t.affinity.eligible_on(core) {
                if t.affinity == Affinity::Unpinned {
                    t.affinity = Affinity::Pinned(core);
                }
                self.current[core.index()] = Pid::new(idx);
                return t.stack_pointer;
            }
        }

        let idle_idx = core.index();
        self.current[core.index()] = Pid::new(idle_idx);
        self.threads[idle_idx].stack_pointer
    }

    /// Quarantine the thread `core` was running when it hard-faulted: mark
    /// it `Faulted` without touching its saved stack pointer (kept around
    /// for postmortem) and without unwinding. The caller must immediately
    /// follow this with `schedule()` to pick a replacement.
    pub fn quarantine_current(&mut self, core: CoreId) {
        let idx = self.current[core.index()].index();
        self.threads[idx].state = ThreadState::Faulted;
    }

    /// Retire the thread `core` is running: it ran to completion via the
    /// termination trampoline. Leaves the pid and `Done` state inspectable
    /// until the slot is reused by `register`.
    pub fn retire_current(&mut self, core: CoreId) {
        let idx = self.current[core.index()].index();
        self.threads[idx].state = ThreadState::Done;
        self.threads[idx].stack_pointer = core::ptr::null_mut();
        self.threads[idx].affinity = Affinity::Unpinned;
    }

    /// Read back a descriptor's state by `Pid`, for postmortem inspection
    /// (spec.md §7: "post-mortem inspection is available by reading the
    /// descriptor"). Caller must have already validated `pid` against the
    /// table bounds — see `kernel::thread_state`.
    pub fn thread_state(&self, pid: Pid) -> ThreadState {
        self.threads[pid.index()].state
    }

    #[cfg(test)]
    pub fn thread_affinity(&self, pid: Pid) -> Affinity {
        self.threads[pid.index()].affinity
    }
}

/// Idle thread body: every core that has nothing else to run lands here
/// and waits for the next tick. Declared with a plain `()` return so its
/// function-pointer type matches `prepare_stack`'s `entry` parameter —
/// the `wfi` loop never actually returns, but the type doesn't need to
/// say so.
extern "C" fn idle_entry() {
    loop {
        cortex_m::asm::wfi();
    }
}

/// Placeholder return address for the idle threads' synthetic frames.
/// Never reached — `idle_entry` loops forever — but the frame format
/// requires some `extern "C" fn() -> !` value in the LR slot.
extern "C" fn idle_unreachable_exit() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn dummy_entry() {}
    extern "C" fn dummy_exit() -> ! {
        loop {}
    }

    fn registered(sched: &mut Scheduler, stack: &'static mut [u32]) -> Pid {
        sched.register(dummy_entry, stack, dummy_exit)
    }

    #[test]
    fn capacity_exhausted_returns_invalid_pid() {
        static mut STACKS: [[u32; 16]; USER_THREADS] = [[0; 16]; USER_THREADS];
        let mut sched = Scheduler::new();
        sched.init_idle();

        for i in 0..USER_THREADS {
            let stack: &'static mut [u32] = unsafe { &mut STACKS[i] };
            let pid = registered(&mut sched, stack);
            assert!(pid.is_valid(), "slot {i} should have been free");
        }

        let mut overflow = [0u32; 16];
        let overflow_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut overflow[..]) };
        assert_eq!(registered(&mut sched, overflow_ref), Pid::INVALID);
    }

    #[test]
    fn register_returns_populated_index_not_a_counter() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let mut a = [0u32; 16];
        let a_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut a[..]) };
        let pid_a = registered(&mut sched, a_ref);
        assert_eq!(pid_a.index(), CORES);

        let mut b = [0u32; 16];
        let b_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut b[..]) };
        let pid_b = registered(&mut sched, b_ref);
        assert_eq!(pid_b.index(), CORES + 1);
    }

    #[test]
    fn idle_is_fallback_when_nothing_runnable() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let sp = sched.schedule(CoreId::Core0);
        assert_eq!(sched.current_pid(CoreId::Core0), Pid::new(0));
        assert_eq!(sp, sched.threads[0].stack_pointer);
    }

    #[test]
    fn first_dispatch_pins_an_unpinned_thread() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let mut a = [0u32; 16];
        let a_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut a[..]) };
        let pid = registered(&mut sched, a_ref);
        assert_eq!(sched.thread_affinity(pid), Affinity::Unpinned);

        sched.schedule(CoreId::Core0);
        assert_eq!(sched.thread_affinity(pid), Affinity::Pinned(CoreId::Core0));

        // Once pinned, the other core must never pick it up.
        sched.current[CoreId::Core1.index()] = Pid::new(1);
        let sp1 = sched.schedule(CoreId::Core1);
        assert_eq!(sp1, sched.threads[1].stack_pointer);
    }

    #[test]
    fn round_robin_rotates_through_peers() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let mut stacks: [[u32; 16]; 3] = [[0; 16]; 3];
        let mut pids = [Pid::INVALID; 3];
        for i in 0..3 {
            let stack: &'static mut [u32] = unsafe { core::mem::transmute(&mut stacks[i][..]) };
            pids[i] = registered(&mut sched, stack);
        }

        sched.schedule(CoreId::Core0);
        let first = sched.current_pid(CoreId::Core0);
        sched.schedule(CoreId::Core0);
        let second = sched.current_pid(CoreId::Core0);
        assert_ne!(first, second, "round robin must move to a different peer");
    }

    #[test]
    fn retire_marks_done_and_frees_eventually() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let mut a = [0u32; 16];
        let a_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut a[..]) };
        let pid = registered(&mut sched, a_ref);
        sched.current[CoreId::Core0.index()] = pid;

        sched.retire_current(CoreId::Core0);
        assert_eq!(sched.thread_state(pid), ThreadState::Done);
        assert_eq!(sched.thread_affinity(pid), Affinity::Unpinned);

        let mut b = [0u32; 16];
        let b_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut b[..]) };
        let reused = registered(&mut sched, b_ref);
        assert_eq!(reused, pid, "a Done slot must be reusable by register()");
    }

    #[test]
    fn quarantine_does_not_clear_stack_pointer() {
        let mut sched = Scheduler::new();
        sched.init_idle();

        let mut a = [0u32; 16];
        let a_ref: &'static mut [u32] = unsafe { core::mem::transmute(&mut a[..]) };
        let pid = registered(&mut sched, a_ref);
        sched.current[CoreId::Core0.index()] = pid;
        let sp_before = sched.threads[pid.index()].stack_pointer;

        sched.quarantine_current(CoreId::Core0);
        assert_eq!(sched.thread_state(pid), ThreadState::Faulted);
        assert_eq!(sched.threads[pid.index()].stack_pointer, sp_before);
    }
}
