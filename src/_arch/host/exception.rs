// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Exception code for running the portable parts on the build machine.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::exception::arch_exception

use crate::cpu;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Stand-in for the assembly catch-all of the firmware.
///
/// # Safety
///
/// - Never returns.
pub unsafe extern "C" fn default_handler() -> ! {
    cpu::wait_forever()
}
