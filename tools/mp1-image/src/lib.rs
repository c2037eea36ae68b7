// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Host tooling for the STM32MP135 kernel image.
//! kernelのimageを扱うhost側のtool
//!
//! - [`header`]: the STM32 header the boot ROM expects in front of the first stage boot loader.
//! - [`flash`]: writing a wrapped image to an SD card.
//! - [`disasm`] and [`check`]: properties of the linked firmware that only its disassembly shows.

pub mod check;
pub mod disasm;
pub mod flash;
pub mod header;
