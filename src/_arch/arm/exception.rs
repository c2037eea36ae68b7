// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Architectural exception vectors.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::exception::arch_exception

use crate::exception::VectorTable;
use core::{arch::global_asm, cell::UnsafeCell};
use cortex_ar::{
    asm,
    register::{Sctlr, Vbar},
};

// Assembly counterpart to this file.
// vector slotsとdefault handlerはassemblyで書いてあるよ．
global_asm!(include_str!("exception.s"));

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// Symbols from exception.s and boot.s.
extern "C" {
    fn _start() -> !;

    /// Catch-all for every exception class without a dedicated handler.
    ///
    /// A `wfe` loop that touches neither the stack nor any other memory, because the stack
    /// pointers of the exception modes are never set up.
    pub fn default_handler() -> !;
}

extern "Rust" {
    static __vectors: UnsafeCell<()>;
}

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

/// The table the `ldr pc` slots of `__vectors` jump through.
/// `__vectors`の`ldr pc`が参照するtable．
///
/// Entry 0 is the reset entry. Kept alive by `#[used]` here and `KEEP()` in the linker script.
#[link_section = ".vectors"]
#[no_mangle]
#[used]
static __VECTOR_TABLE: VectorTable = VectorTable::new(_start);

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Point VBAR at the vector slots and select low vectors.
/// VBARにvector slotsのaddressを書いて，SCTLR.Vを0にするよ．
///
/// # Safety
///
/// - Changes the HW state of the executing core.
/// - Touches no memory, so it may run before `.bss` is initialized.
#[inline(always)]
pub unsafe fn install_vector_base() {
    Vbar::write(Vbar(__vectors.get() as _));

    // SCTLR.V = 0: vectors at VBAR instead of the high vectors at 0xFFFF_0000.
    Sctlr::write(Sctlr::read().with_v(false));

    // Force the changes to be seen before the next instruction.
    asm::isb();
}
