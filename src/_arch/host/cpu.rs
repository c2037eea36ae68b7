// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Processor code for running the portable parts on the build machine.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::cpu::arch_cpu

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// One cycle of doing nothing.
#[inline(always)]
pub fn nop() {
    core::hint::spin_loop()
}

/// Pause execution of the calling thread for good.
#[inline(always)]
pub fn wait_forever() -> ! {
    loop {
        // Under the test harness, park instead of burning a host core.
        #[cfg(test)]
        std::thread::park();

        #[cfg(not(test))]
        core::hint::spin_loop();
    }
}
