//! # Cortex-M0+ Port Layer
//!
//! Hardware-specific code for the ARMv6-M processor used by both RP2040
//! cores. Implements context switching via PendSV, SysTick configuration,
//! and hard-fault quarantine.
//!
//! ## Context Switch Mechanism
//!
//! Like every Cortex-M, this uses a split-stack model: MSP for the kernel
//! and exception handlers, PSP for threads in Thread mode. On exception
//! entry, hardware automatically stacks R0–R3, R12, LR, PC and xPSR onto
//! the active stack. PendSV manually saves and restores R4–R11 to complete
//! the picture.
//!
//! ARMv6-M's 16-bit Thumb encoding can't `push`/`pop`/`stm`/`ldm` high
//! registers (R8–R11) directly — only R0–R7 and, for push/pop, LR/PC. Every
//! routine below that touches R8–R11 relays them through a low register
//! with `mov` first. This is the same restriction that (for example)
//! FreeRTOS's and Zephyr's Cortex-M0 ports work around.
//!
//! ## Interrupt priorities
//!
//! SysTick is the highest-priority configurable exception; PendSV is the
//! lowest. This is the opposite of "both lowest" — PendSV must never
//! preempt SysTick's own reschedule decision, and SysTick must never be
//! starved by a long-running ISR so ticks aren't lost.

use core::arch::asm;
use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m_rt::{exception, ExceptionFrame};

use crate::config::SCHEDULER_INTERVAL_US;
use crate::klog;
use crate::thread::CoreId;

// ---------------------------------------------------------------------------
// Core identity
// ---------------------------------------------------------------------------

/// Which core is executing the current instruction. Backed by the RP2040's
/// per-core CPUID view in the SIO block — the same address reads a
/// different value depending on which core performs the read.
#[inline]
pub fn current_core() -> CoreId {
    match rp2040_hal::Sio::core() {
        rp2040_hal::CoreId::Core0 => CoreId::Core0,
        rp2040_hal::CoreId::Core1 => CoreId::Core1,
    }
}

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure this core's SysTick for the scheduler tick.
///
/// SysTick is a per-core peripheral on ARMv6-M/RP2040 — each core calls
/// this independently during its own startup, with the same system clock
/// frequency (both cores run off the same `clk_sys`).
pub fn configure_systick(syst: &mut SYST, sys_clock_hz: u32) {
    let reload = (sys_clock_hz / 1_000_000) * SCHEDULER_INTERVAL_US;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick to the highest configurable priority and PendSV to the
/// lowest, on this core.
pub fn set_interrupt_priorities(scb: &mut SCB) {
    unsafe {
        scb.set_priority(SystemHandler::SysTick, 0x00);
        scb.set_priority(SystemHandler::PendSV, 0xFF);
    }
}

// ---------------------------------------------------------------------------
// First thread launch
// ---------------------------------------------------------------------------

/// Cold-switch this core into its first thread (always the idle thread at
/// startup) by pointing PSP at its prepared stack and faking an exception
/// return. Never returns.
///
/// # Safety
/// Must be called exactly once per core, before any other PSP-affecting
/// code runs on that core, with a stack pointer `prepare_stack` produced.
pub unsafe fn start_first_thread(psp: *const u32) -> ! {
    asm!(
        "adds r0, #32", // skip the 8 software-saved words
        "msr psp, r0",
        "movs r1, #2", // CONTROL.SPSEL = 1: use PSP in Thread mode
        "msr control, r1",
        "isb",
        "pop {{r0-r3}}",
        "pop {{r4}}", // was R12
        "mov r12, r4",
        "pop {{r4}}", // was LR; thread never returns through it
        "pop {{r5}}", // was PC: thread entry point
        "pop {{r6}}", // was xPSR; Thumb bit is implicit in Thread mode
        "cpsie i",
        "bx r5",
        in("r0") psp,
        options(noreturn)
    );
}

// ---------------------------------------------------------------------------
// PendSV handler (context switch)
// ---------------------------------------------------------------------------

/// PendSV exception handler — the deferred context switch.
///
/// 1. Save R4–R11 onto the current thread's stack (PSP)
/// 2. Store the updated PSP into the current descriptor
/// 3. Fall into the shared resume tail to select and restore the next thread
///
/// # Safety
/// Naked function entered directly by hardware; must follow the exact
/// ARMv6-M exception contract.
#[no_mangle]
#[naked]
pub unsafe extern "C" fn PendSV() {
    asm!(
        "mrs r0, psp",
        "subs r0, #32",
        "stmia r0!, {{r4-r7}}", // real r4-r7 at [base+0, base+16)
        "mov r4, r8",
        "mov r5, r9",
        "mov r6, r10",
        "mov r7, r11",
        "stmia r0!, {{r4-r7}}", // r8-r11 (relayed) at [base+16, base+32)
        "subs r0, #32",         // r0 = base, the value to save as this thread's sp
        "bl {save_context}",
        "b {resume}",
        save_context = sym save_current_context,
        resume = sym resume_into_next_thread,
        options(noreturn)
    );
}

/// Store the just-saved stack pointer into the current thread's descriptor.
/// Called only from `PendSV`, with interrupts already effectively serialized
/// (we're in Handler mode).
///
/// # Safety
/// Must run with the scheduler lock free to acquire — PendSV never
/// interrupts code that's mid-update of the thread table on this core.
#[no_mangle]
unsafe extern "C" fn save_current_context(sp: *mut u32) {
    let core = current_core();
    let _guard = crate::lock::acquire();
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    scheduler.save_stack_pointer(core, sp);
}

/// Shared resume tail: pick the next thread and restore it. Used by both
/// `PendSV` (after saving the outgoing thread) and `HardFault` (which skips
/// the save — the faulting thread's registers are abandoned).
///
/// # Safety
/// Naked, noreturn; only valid to branch into with PSP pointing somewhere
/// sane for whichever thread is about to be replaced (unused by this
/// function itself — it only ever writes a fresh PSP before returning).
#[naked]
unsafe extern "C" fn resume_into_next_thread() -> ! {
    asm!(
        "bl {do_schedule}", // r0 = base of the chosen thread's saved frame
        "adds r0, #16",
        "ldmia r0!, {{r4-r7}}", // relayed r8-r11 values
        "mov r8, r4",
        "mov r9, r5",
        "mov r10, r6",
        "mov r11, r7",
        "subs r0, #32",
        "ldmia r0!, {{r4-r7}}", // real r4-r7, direct — nothing clobbers them after
        "adds r0, #16",        // r0 = hardware frame start
        "msr psp, r0",
        "ldr r1, =0xFFFFFFFD", // EXC_RETURN: return to Thread mode using PSP
        "bx r1",
        do_schedule = sym do_context_switch,
        options(noreturn)
    );
}

/// Run the scheduling decision for this core and return the chosen
/// thread's saved stack pointer.
///
/// # Safety
/// Called from assembly context with this core's SysTick already disabled
/// for the duration of the reschedule by virtue of being inside PendSV/
/// HardFault.
#[no_mangle]
unsafe extern "C" fn do_context_switch() -> *mut u32 {
    let core = current_core();
    let _guard = crate::lock::acquire();
    let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
    let sp = scheduler.schedule(core);
    crate::kernel::notify_activity(core, scheduler.current_pid(core));
    sp
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler. Fires once per scheduler interval on each
/// core independently; the only work on this fast path is deciding whether
/// to request a reschedule.
#[exception]
fn SysTick() {
    SCB::set_pendsv();
    klog::trace!("systick: pendsv requested");
}

// ---------------------------------------------------------------------------
// HardFault handler — quarantine and reschedule
// ---------------------------------------------------------------------------

/// The only configurable fault vector on ARMv6-M (no MemManage/BusFault/
/// UsageFault — those first appear on ARMv7-M). Rather than unwinding or
/// looping forever, this quarantines the faulting thread and immediately
/// resumes into whatever the scheduler picks next. It never returns to the
/// faulting code.
///
/// The faulting PSP is available via `frame` (preserved for postmortem, per
/// the descriptor's untouched `stack_pointer` field) but this handler does
/// not need to save R4–R11 — that register state belongs to a thread that
/// will never run again.
#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    let core = current_core();
    klog::error!("hardfault on core {}: pc={:x}", core.index(), frame.pc);

    {
        let _guard = crate::lock::acquire();
        let scheduler = &mut *crate::kernel::SCHEDULER_PTR;
        scheduler.quarantine_current(core);
    }

    resume_into_next_thread()
}
