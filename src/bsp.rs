// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Conditional reexporting of Board Support Packages.
//!
//! The STM32MP135 is the only board so far. Its linker script is only passed to the linker when
//! the `bsp_stm32mp135` feature is active.

mod device_driver;
mod stm32mp135;

pub use stm32mp135::*;
