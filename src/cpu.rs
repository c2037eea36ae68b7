// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2020-2022 Andre Richter <andre.o.richter@gmail.com>

//! Processor code.
//! processor関連のcode

#[cfg(target_arch = "arm")]
#[path = "_arch/arm/cpu.rs"]
mod arch_cpu;

#[cfg(not(target_arch = "arm"))]
#[path = "_arch/host/cpu.rs"]
mod arch_cpu;

mod boot;

//--------------------------------------------------------------------------------------------------
// Architectural Public Reexports
//--------------------------------------------------------------------------------------------------
pub use arch_cpu::{nop, wait_forever};

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The terminal state for linked C/C++ code.
/// C/C++のcodeから呼ばれる終端状態
///
/// Same idle loop the default exception handler, the pure-virtual trap and a returning
/// `kernel_init()` end up in.
#[cfg_attr(target_os = "none", no_mangle)]
pub extern "C" fn infinite_loop() -> ! {
    wait_forever()
}
