// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! BSP Memory Management.
//! BSPのmemory管理
//!
//! The boot ROM copies the image into SYSRAM and enters it at its first byte, which is the vector
//! base. The linker script lays out the image like this:
//!
//! ```text
//!      +---------------------------------------+ 0x2FFE_0000 (SYSRAM start)
//!      | __vectors  (8x ldr pc, [pc, #24])     |
//!      | __VECTOR_TABLE (8 handler addresses)  |
//!      | .text                                 |
//!      | .rodata                               |
//!      | .init_array                           |
//!      +---------------------------------------+
//!      | .data                                 |
//!      +---------------------------------------+
//!      | .bss                     (zero-fill)  |
//!      +---------------------------------------+
//!      | .boot_stack              (NOLOAD)     |
//!      +---------------------------------------+ at most 0x3000_0000 (SYSRAM end)
//!      | .data, run copy          (optional)   |
//!      +---------------------------------------+ at most 0x3000_8000 (SRAM3 end)
//! ```
//!
//! The boot stack sits above `.bss` on purpose: zeroing `.bss` must not clear the frames of the
//! code doing it.
//! `.bss`を0で埋めるcode自身のstack frameを消さないように，stackは`.bss`より上に置くよ．
//!
//! `.data` is always loaded into SYSRAM. With the `relocate_data` feature it runs from SRAM1..3,
//! and the runtime copies it there before any static initialization routine runs. The SRAM clocks
//! must be enabled by the previous boot stage in that case.

#[cfg(target_os = "none")]
use crate::runtime_init::{DataRelocation, InitRoutine, RuntimeImage};
#[cfg(target_os = "none")]
use core::{cell::UnsafeCell, ops::Range};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// Symbols from the linker script.
#[cfg(target_os = "none")]
extern "Rust" {
    static __bss_start: UnsafeCell<u32>;
    static __bss_end_exclusive: UnsafeCell<u32>;

    static __data_start: UnsafeCell<u32>;
    static __data_end_exclusive: UnsafeCell<u32>;
    static __data_load_start: UnsafeCell<u32>;

    static __init_array_start: UnsafeCell<InitRoutine>;
    static __init_array_end_exclusive: UnsafeCell<InitRoutine>;
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// The board's physical memory map.
/// boardの物理memory map
///
/// `kernel.ld` repeats the SYSRAM and SRAM numbers; keep both in sync.
#[rustfmt::skip]
pub(super) mod map {
    pub const SYSRAM_START: usize = 0x2FFE_0000;
    pub const SYSRAM_SIZE:  usize = 0x0002_0000;

    /// SRAM1, SRAM2 and SRAM3, back to back, 32 KiB in total.
    pub const SRAM_START:   usize = 0x3000_0000;

    /// Physical devices.
    pub mod mmio {
        pub const UART4_START: usize = 0x4001_0000;
    }
}

// VBAR ignores the low five bits, and the image starts with the vectors.
const _: () = assert!(map::SYSRAM_START % 32 == 0);
const _: () = assert!(super::cpu::BOOT_STACK_SIZE < map::SYSRAM_SIZE);
// The relocated `.data` must never overlap the image it is copied from.
const _: () = assert!(map::SYSRAM_START + map::SYSRAM_SIZE <= map::SRAM_START);

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// The range spanning the .bss section.
/// .bss sectionの範囲[start, end)
///
/// # Safety
///
/// - Values are provided by the linker script and must be trusted as-is.
/// - The linker-provided addresses must be u32 aligned.
#[cfg(target_os = "none")]
fn bss_range() -> Range<*mut u32> {
    unsafe { __bss_start.get()..__bss_end_exclusive.get() }
}

/// Where `.data` was loaded and where it runs, if the runtime has to copy it.
/// `relocate_data`が無効ならload先と実行先は同じなので，copyはしないよ．
#[cfg(target_os = "none")]
fn data_relocation() -> Option<DataRelocation> {
    if !cfg!(feature = "relocate_data") {
        return None;
    }

    unsafe {
        Some(DataRelocation {
            load: __data_load_start.get() as *const u32,
            run: __data_start.get()..__data_end_exclusive.get(),
        })
    }
}

/// The static initialization routines, in the order the linker collected them.
#[cfg(target_os = "none")]
fn init_array() -> &'static [InitRoutine] {
    unsafe {
        let start = __init_array_start.get() as *const InitRoutine;
        let end = __init_array_end_exclusive.get() as *const InitRoutine;
        let len = (end as usize - start as usize) / core::mem::size_of::<InitRoutine>();

        core::slice::from_raw_parts(start, len)
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Everything the runtime needs to know about the image.
#[cfg(target_os = "none")]
pub fn runtime_image() -> RuntimeImage<'static> {
    RuntimeImage {
        bss: bss_range(),
        data: data_relocation(),
        init_array: init_array(),
    }
}
