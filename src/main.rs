//! # Demo Firmware
//!
//! Brings up the RP2040's clocks, registers a small set of user threads,
//! and starts the scheduler on both cores. Mirrors the reference
//! firmware's `test`/`test2` pair: one thread spawns a second thread and
//! then returns, exercising both the "register from a running thread"
//! path and the termination trampoline in the same run.
//!
//! Board bring-up beyond what `kernel::start` needs (clock tree, GPIO) is
//! out of scope for the kernel itself — this file is just a caller, not
//! part of the crate.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;
#[cfg(feature = "klog")]
use defmt_rtt as _;
use rp2040_hal::{self as hal, clocks::init_clocks_and_plls, pac, Watchdog};

use rp2040_rtos::kernel;
use rp2040_rtos::klog;

/// RP2040 boards generally carry a 12 MHz crystal.
const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;

/// Second-stage bootloader, linked into the `.boot2` section `memory.x`
/// reserves at the start of flash. Without it the on-chip ROM has no XIP
/// configuration to hand off to and the board never reaches `main`.
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

static mut STACK_A: [u32; 128] = [0; 128];
static mut STACK_B: [u32; 128] = [0; 128];

/// Registered by `thread_a` once it's already running. Does nothing and
/// returns immediately — the termination trampoline retires it.
extern "C" fn thread_b() {}

/// Registers `thread_b` from inside a running thread, then returns itself.
/// Both descriptors end up `Done`, leaving the user pool empty again.
extern "C" fn thread_a() {
    let stack_b: &'static mut [u32] = unsafe { &mut STACK_B };
    let _ = kernel::register(thread_b, stack_b);
}

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let core = cortex_m::Peripherals::take().unwrap();

    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let clocks = init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    kernel::init(None);

    let stack_a: &'static mut [u32] = unsafe { &mut STACK_A };
    let pid_a = kernel::register(thread_a, stack_a);
    klog::info!("registered thread_a as pid {}", pid_a.index());

    let sys_clock_hz: u32 = hal::Clock::freq(&clocks.system_clock).to_Hz();
    kernel::start(core, pac.SIO, pac.PSM, pac.PPB, sys_clock_hz)
}
