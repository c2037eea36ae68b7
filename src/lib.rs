// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! The `kernel` library.
//!
//! Startup code and minimal runtime for a bare-metal STM32MP135 (Cortex-A7) image.
//!
//! # Code organization and architecture
//!
//! The code is divided into different *modules*, each representing a typical **subsystem** of the
//! `kernel`. Top-level module files of subsystems reside directly in the `src` folder. For example,
//! `src/memory.rs` contains code that is concerned with all things memory management.
//!
//! ## Visibility of processor architecture code
//!
//! Some of the `kernel`'s subsystems depend on low-level code that is specific to the target
//! processor architecture. For each supported processor architecture, there exists a subfolder in
//! `src/_arch`, for example, `src/_arch/arm`.
//!
//! The architecture folders mirror the subsystem modules laid out in `src`. For example,
//! architectural code that belongs to the `kernel`'s exception subsystem (`src/exception.rs`) would
//! go into `src/_arch/arm/exception.rs`. This file is directly included and re-exported in
//! `src/exception.rs` using the `path attribute`. `src/_arch/host` holds the few pieces needed to
//! run the portable parts under `cargo test` on the build machine.
//!
//! ## BSP code
//!
//! `BSP` stands for Board Support Package. `BSP` code is organized under `src/bsp.rs` and contains
//! target board specific definitions and functions: the memory map, the linker script, the boot
//! stack size and the console instance.
//!
//! # Boot flow
//!
//! 1. The boot ROM enters the image at the vector base. The reset slot jumps through entry 0 of the
//!    vector table to `_start()` (`src/_arch/arm/cpu/boot.s`).
//! 2. `_start()` loads the stack pointer and branches to `_start_rust()`.
//! 3. `_start_rust()` installs the vector base and calls `runtime_init::runtime_init()`.
//! 4. The runtime zero-fills `.bss`, optionally relocates `.data`, runs `.init_array` and then
//!    calls `kernel_init()` of the binary. Should that ever return, the core parks in
//!    `cpu::wait_forever()`.

#![cfg_attr(not(test), no_std)]

mod panic_wait;
mod synchronization;

pub mod bsp;
pub mod console;
pub mod cpu;
pub mod cxxabi;
pub mod exception;
pub mod memory;
pub mod print;
pub mod runtime_init;
