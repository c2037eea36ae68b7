// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Properties of the linked firmware that source-level tests cannot see.
//! linkされたfirmwareでしか確かめられない性質を調べるよ．
//!
//! - Nothing calls the `delete` family. The runtime has no heap, and those symbols only exist to
//!   satisfy C++ object code that names them.
//! - `default_handler` touches no memory. It runs on the banked stack pointer of whichever mode
//!   took the exception, and only the supervisor mode stack is ever set up.

use crate::disasm::{BranchSite, Disassembly, Instruction};
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Mangled names of `operator delete(void*)`, `operator delete[](void*)` and their sized
/// variants on 32 bit ARM.
pub const DELETE_FAMILY: [&str; 4] = ["_ZdlPv", "_ZdaPv", "_ZdlPvj", "_ZdaPvj"];

/// Symbol the vector table routes every exception class but reset to.
pub const DEFAULT_HANDLER: &str = "default_handler";

/// Instructions a handler without a stack may consist of.
const STACKLESS_MNEMONICS: [&str; 4] = ["wfe", "wfi", "nop", "b"];

/// A broken property.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    DeleteCalled(BranchSite),
    DefaultHandlerMissing,
    DefaultHandlerTouchesMemory(Instruction),
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteCalled(site) => write!(
                f,
                "{} calls {} at {:#010x}",
                site.caller, site.target, site.address
            ),
            Self::DefaultHandlerMissing => write!(f, "no {} in the image", DEFAULT_HANDLER),
            Self::DefaultHandlerTouchesMemory(instruction) => write!(
                f,
                "{} executes `{} {}` at {:#010x}",
                DEFAULT_HANDLER, instruction.mnemonic, instruction.operands, instruction.address
            ),
        }
    }
}

/// Every violation found in `disassembly`. Empty means the image is fine.
pub fn firmware(disassembly: &Disassembly) -> Vec<Violation> {
    let mut violations: Vec<Violation> = disassembly
        .branches_to(&DELETE_FAMILY)
        .into_iter()
        .map(Violation::DeleteCalled)
        .collect();

    match disassembly.function(DEFAULT_HANDLER) {
        None => violations.push(Violation::DefaultHandlerMissing),
        Some(instructions) => violations.extend(
            instructions
                .iter()
                .filter(|instruction| {
                    !STACKLESS_MNEMONICS.contains(&instruction.mnemonic.as_str())
                        || instruction.operands.contains("sp")
                })
                .cloned()
                .map(Violation::DefaultHandlerTouchesMemory),
        ),
    }

    violations
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "
2ffe0fa0 <default_handler>:
2ffe0fa0:      \twfe
2ffe0fa4:      \tb\t0x2ffe0fa0 <default_handler>

2ffe1000 <kernel_init>:
2ffe1000:      \tpush\t{r11, lr}
2ffe1004:      \tbl\t0x2ffe2000 <_ZN9libkernel3cpu12wait_forever17h0123456789abcdefE>
";

    /// What a handler written in Rust compiles to: a frame push on an unset stack.
    const RUST_HANDLER: &str = "
2ffe0fa0 <default_handler>:
2ffe0fa0:      \tpush\t{r11, lr}
2ffe0fa4:      \tmov\tr11, sp
2ffe0fa8:      \twfe
2ffe0fac:      \tb\t0x2ffe0fa8 <default_handler+0x8>
";

    const DELETE_CALLER: &str = "
2ffe0fa0 <default_handler>:
2ffe0fa0:      \twfe
2ffe0fa4:      \tb\t0x2ffe0fa0 <default_handler>

2ffe1000 <_ZN4Demo7destroyEv>:
2ffe1000:      \tbl\t0x2ffe2000 <_ZdlPvj>
";

    #[test]
    fn clean_image_passes() {
        assert!(firmware(&Disassembly::parse(GOOD)).is_empty());
    }

    #[test]
    fn handler_with_a_frame_is_flagged() {
        let violations = firmware(&Disassembly::parse(RUST_HANDLER));

        let flagged: Vec<&str> = violations
            .iter()
            .map(|violation| match violation {
                Violation::DefaultHandlerTouchesMemory(instruction) => {
                    instruction.mnemonic.as_str()
                }
                other => panic!("unexpected {}", other),
            })
            .collect();
        assert_eq!(flagged, ["push", "mov"]);
    }

    #[test]
    fn delete_call_is_flagged() {
        let violations = firmware(&Disassembly::parse(DELETE_CALLER));

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].to_string(),
            "_ZN4Demo7destroyEv calls _ZdlPvj at 0x2ffe1000"
        );
    }

    #[test]
    fn missing_handler_is_flagged() {
        assert_eq!(
            firmware(&Disassembly::parse("")),
            [Violation::DefaultHandlerMissing]
        );
    }
}
