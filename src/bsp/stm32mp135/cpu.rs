// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! BSP Processor code.

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Size of the stack `_start()` sets up for the boot core.
/// `_start()`が用意するboot core用のstackの大きさ
pub const BOOT_STACK_SIZE: usize = 0x1000;

// The AAPCS demands 8 byte alignment of the stack pointer at public interfaces.
const _: () = assert!(BOOT_STACK_SIZE > 0 && BOOT_STACK_SIZE % 8 == 0);
