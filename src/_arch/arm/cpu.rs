// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Architectural processor code.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::cpu::arch_cpu

use cortex_ar::asm;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

pub use asm::nop;

/// Pause execution on the core.
/// coreの実行を止めるよ．これがsystemの唯一の終端状態．
///
/// Nothing is saved and nothing is retried.
#[inline(always)]
pub fn wait_forever() -> ! {
    loop {
        // イベント待ちで止まるよ．イベントが来ても，またここに戻ってくるよ．
        asm::wfe()
    }
}
