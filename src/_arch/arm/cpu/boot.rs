// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2021-2022 Andre Richter <andre.o.richter@gmail.com>

//! Architectural boot code.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::cpu::boot::arch_boot

use crate::{bsp, exception, memory::BootStack, runtime_init};
use core::arch::global_asm;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

/// The stack `_start()` runs on, and everything after it.
///
/// Lives in its own NOLOAD section outside of `.bss`, so zeroing `.bss` never clears live frames.
#[link_section = ".boot_stack"]
static mut BOOT_STACK: BootStack<{ bsp::cpu::BOOT_STACK_SIZE }> = BootStack::new();

// Assembly counterpart to this file.
// boot.sの中で，スタックの先頭addressをBOOT_STACK + BOOT_STACK_SIZEとして計算するよ．
global_asm!(
    include_str!("boot.s"),
    BOOT_STACK = sym BOOT_STACK,
    BOOT_STACK_SIZE = const bsp::cpu::BOOT_STACK_SIZE,
    START_RUST = sym _start_rust,
);

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The Rust entry of the `kernel` binary.
///
/// The function is called from the assembly `_start` function.
///
/// # Safety
///
/// - The `bss` section is not initialized yet. The code must not use or reference it in any way.
#[no_mangle]
pub unsafe extern "C" fn _start_rust() -> ! {
    exception::install_vector_base();

    runtime_init::runtime_init()
}
