//! # Dual-Core RP2040 Thread Scheduler
//!
//! A small preemptive kernel for the Raspberry Pi RP2040: a fixed-size
//! thread table shared by both Cortex-M0+ cores, SysTick-driven
//! preemption, a PendSV context-switch trampoline, and round-robin
//! scheduling with first-dispatch core affinity.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  Application Threads                    │
//! ├────────────────────────────────────────────────────────┤
//! │               Kernel API (kernel.rs)                    │
//! │    init() · register() · start() · enter/leave_critical │
//! ├──────────────┬───────────────────────┬─────────────────┤
//! │  Scheduler   │   Cross-core lock     │  Activity hook  │
//! │  scheduler.rs│   lock.rs             │  led.rs         │
//! │  ─ register()│   ─ SIO spinlock      │  ─ trait only   │
//! │  ─ schedule()│                       │                 │
//! ├──────────────┴───────────────────────┴─────────────────┤
//! │            Thread Model (thread.rs)                      │
//! │  ThreadDescriptor · Pid · Affinity · ThreadState         │
//! ├────────────────────────────────────────────────────────┤
//! │         Arch Port (arch/cortex_m0.rs)                    │
//! │   PendSV · SysTick · HardFault · Stack synthesis         │
//! ├────────────────────────────────────────────────────────┤
//! │      RP2040 (2× ARMv6-M Cortex-M0+, shared SIO)          │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling policy
//!
//! All user threads are peers — there are no priority levels. Selection is
//! round-robin among runnable threads eligible for the requesting core,
//! starting just past whatever that core last ran. A thread is pinned to
//! whichever core first dispatches it and never migrates afterward; until
//! then it may run on either core.
//!
//! ## Memory model
//!
//! - No heap, no `alloc` — pure `core` plus the fixed thread table.
//! - Thread stacks are caller-owned `&'static mut [u32]` regions, not
//!   embedded in the descriptor.
//! - The only synchronization primitive is the cross-core lock guarding the
//!   thread table; there is no blocking, messaging, or cancellation API.

#![no_std]

pub mod config;
pub mod error;
pub mod kernel;
pub mod klog;
pub mod led;
pub mod lock;
pub mod scheduler;
pub mod thread;

pub mod arch;
