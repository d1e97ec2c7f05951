//! # Architecture Abstraction Layer
//!
//! Hardware-specific code lives here, behind a boundary the scheduler never
//! reaches across. Currently implements the ARMv6-M (Cortex-M0+) port used
//! by the RP2040; extensible to other architectures by adding sibling
//! modules.

pub mod cortex_m0;
