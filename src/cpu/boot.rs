// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2021-2022 Andre Richter <andre.o.richter@gmail.com>

//! Boot code.

// 実機(ARMv7-A, bare metal)向けのときだけ_arch/arm/cpu/boot.rsを使うよ．
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[path = "../_arch/arm/cpu/boot.rs"]
mod arch_boot;
