//! # Kernel
//!
//! Top-level initialization and the four-operation public API: `init`,
//! `register`, `start`, and the `enter_critical`/`leave_critical` pair.
//! Also owns the termination trampoline every registered thread's initial
//! stack frame points its return address at.
//!
//! ## Startup sequence
//!
//! ```text
//! reset_handler (cortex-m-rt, core 0 only)
//!   └─► main()
//!         ├─► kernel::init(activity)     ← build idle descriptors
//!         ├─► kernel::register() × N     ← register user threads
//!         └─► kernel::start(cp, dp, hz)  ← launch both cores, no return
//!               ├─► launch core 1 (rp2040-hal multicore)
//!               └─► each core: SysTick + priorities + first dispatch
//! ```

use crate::arch::cortex_m0;
use crate::config::MAX_THREADS;
use crate::error::KernelError;
use crate::klog;
use crate::lock;
use crate::scheduler::Scheduler;
use crate::thread::{CoreId, Pid, ThreadState};
use rp2040_hal::multicore::{Multicore, Stack};

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance, shared by both cores.
///
/// # Safety
/// Every access goes through `SCHEDULER_PTR`, and every access to the
/// thread table it owns is made while holding `lock::acquire()` — the
/// single exception is `init`, which runs before either core is scheduling
/// anything.
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the global scheduler. The arch layer (PendSV, SysTick,
/// HardFault) reaches the scheduler through this rather than a reference,
/// since naked asm can't carry Rust references across the call boundary.
#[no_mangle]
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

/// Board-supplied activity indicator, if one was registered at `init`.
#[cfg(feature = "status-led")]
static mut ACTIVITY: Option<&'static dyn crate::led::ActivityIndicator> = None;

/// Tell the registered activity indicator (if any) what `core` just landed
/// on. Called from `arch::cortex_m0::do_context_switch` while the scheduler
/// lock is still held, matching the shared-resource rule in the system
/// design: LED state is written by the scheduler under the lock, never from
/// an unsynchronized ISR tail.
///
/// Compiles away entirely when the `status-led` feature is off: no
/// `ActivityIndicator` storage, no dispatch/idle classification, nothing.
#[cfg(feature = "status-led")]
pub(crate) unsafe fn notify_activity(core: CoreId, dispatched: Pid) {
    if let Some(indicator) = ACTIVITY {
        if dispatched.index() == core.index() {
            indicator.on_idle(core);
        } else {
            indicator.on_dispatch(core);
        }
    }
}

#[cfg(not(feature = "status-led"))]
#[inline]
pub(crate) unsafe fn notify_activity(_core: CoreId, _dispatched: Pid) {}

/// Stack for core 1, handed to `rp2040_hal::multicore::Core::spawn`.
static mut CORE1_LAUNCH_STACK: Stack<1024> = Stack::new();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel: build the two idle descriptors and register an
/// optional activity indicator.
///
/// # Safety
/// Must be called exactly once, from core 0, before `register` or `start`.
pub fn init(activity: Option<&'static dyn crate::led::ActivityIndicator>) {
    unsafe {
        SCHEDULER = Scheduler::new();
        SCHEDULER_PTR = &mut SCHEDULER as *mut Scheduler;
        (*SCHEDULER_PTR).init_idle();
        #[cfg(feature = "status-led")]
        {
            ACTIVITY = activity;
        }
        #[cfg(not(feature = "status-led"))]
        let _ = activity;
    }
}

/// Register a new thread. `stack` must be at least 16 words and must not
/// be reused elsewhere for as long as this thread can run.
///
/// Returns the claimed thread's `Pid`, or `Pid::INVALID` if the user pool
/// is full.
pub fn register(entry: extern "C" fn(), stack: &'static mut [u32]) -> Pid {
    let pid = {
        let _guard = lock::acquire();
        unsafe { (*SCHEDULER_PTR).register(entry, stack, thread_exit) }
    };
    if pid.is_valid() {
        klog::debug!("registered thread pid={}", pid.index());
    } else {
        klog::warn!("thread registration failed: no free slot");
    }
    pid
}

/// Read back a thread's last-known state by `Pid`, for postmortem
/// inspection (spec.md §7). Returns `Err(KernelError::InvalidPid)` for
/// `Pid::INVALID` or any index outside the thread table, rather than
/// panicking on an out-of-range caller-supplied pid.
pub fn thread_state(pid: Pid) -> Result<ThreadState, KernelError> {
    if !pid.is_valid() || pid.index() >= MAX_THREADS {
        return Err(KernelError::InvalidPid);
    }
    let _guard = lock::acquire();
    Ok(unsafe { (*SCHEDULER_PTR).thread_state(pid) })
}

/// Launch both cores. Does not return.
///
/// Takes only the three device peripherals the multicore launch protocol
/// needs (`SIO`, `PSM`, `PPB`) rather than the whole `pac::Peripherals`, so
/// callers can freely consume the rest (clocks, watchdog, GPIO banks)
/// before calling this.
///
/// # Safety
/// `init()` must already have run.
pub fn start(
    core0_peripherals: cortex_m::Peripherals,
    sio_dev: rp2040_hal::pac::SIO,
    mut psm: rp2040_hal::pac::PSM,
    mut ppb: rp2040_hal::pac::PPB,
    sys_clock_hz: u32,
) -> ! {
    let mut sio = rp2040_hal::Sio::new(sio_dev);
    let mut mc = Multicore::new(&mut psm, &mut ppb, &mut sio.fifo);
    let cores = mc.cores();
    let core1 = &mut cores[1];

    core1
        .spawn(unsafe { &mut CORE1_LAUNCH_STACK.mem }, move || {
            let core1_peripherals = unsafe { cortex_m::Peripherals::steal() };
            launch_core(core1_peripherals, sys_clock_hz, CoreId::Core1)
        })
        .expect("failed to launch core 1");

    launch_core(core0_peripherals, sys_clock_hz, CoreId::Core0)
}

/// Per-core startup tail: program this core's SysTick and NVIC priorities,
/// then cold-jump into its idle thread. Identical on both cores.
fn launch_core(mut peripherals: cortex_m::Peripherals, sys_clock_hz: u32, core: CoreId) -> ! {
    cortex_m0::configure_systick(&mut peripherals.SYST, sys_clock_hz);
    cortex_m0::set_interrupt_priorities(&mut peripherals.SCB);

    let sp = unsafe { (*SCHEDULER_PTR).current_stack_pointer(core) };
    unsafe { cortex_m0::start_first_thread(sp) }
}

// ---------------------------------------------------------------------------
// Critical-section gates
// ---------------------------------------------------------------------------

const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const SYST_CSR_ENABLE: u32 = 1 << 0;

/// Disable this core's SysTick counter. Does not touch the other core, and
/// does not mask any other interrupt — a tick that becomes pending while
/// the gate is closed still fires (and reschedules) as soon as
/// `leave_critical` reopens it.
pub fn enter_critical() {
    unsafe {
        let csr = core::ptr::read_volatile(SYST_CSR);
        core::ptr::write_volatile(SYST_CSR, csr & !SYST_CSR_ENABLE);
    }
}

/// Re-enable this core's SysTick counter.
pub fn leave_critical() {
    unsafe {
        let csr = core::ptr::read_volatile(SYST_CSR);
        core::ptr::write_volatile(SYST_CSR, csr | SYST_CSR_ENABLE);
    }
}

// ---------------------------------------------------------------------------
// Termination trampoline
// ---------------------------------------------------------------------------

/// Every thread's initial stack frame is built with this as its return
/// address. A thread that runs off the end of its entry function lands
/// here instead of into undefined memory: the descriptor is retired
/// (`ThreadState::Done`) and this core immediately busy-waits for the next
/// tick to reschedule something else.
extern "C" fn thread_exit() -> ! {
    let core = cortex_m0::current_core();
    {
        let _guard = lock::acquire();
        unsafe { (*SCHEDULER_PTR).retire_current(core) };
    }
    klog::debug!("thread on core {} returned, retired", core.index());
    loop {
        cortex_m::asm::wfi();
    }
}
