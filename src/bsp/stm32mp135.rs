// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Top-level BSP file for the STM32MP135.
//! STM32MP135用のBSPの最上位file

pub mod console;
pub mod cpu;
pub mod memory;

use super::device_driver;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

/// UART4, wired to the ST-LINK virtual COM port on the STM32MP135 discovery kit.
/// discovery kitではST-LINKの仮想COM portにつながっているよ．
static UART4: device_driver::StmUsart =
    unsafe { device_driver::StmUsart::new(memory::map::mmio::UART4_START) };

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Board identification.
pub fn board_name() -> &'static str {
    "STM32MP135"
}
