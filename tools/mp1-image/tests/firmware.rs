// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Checks on the linked kernel.
//!
//! Needs a firmware build and `rust-objdump` (`cargo install cargo-binutils`):
//!
//! ```text
//! cargo build --release --target armv7a-none-eabi --features bsp_stm32mp135
//! cargo test -p mp1-image
//! ```
//!
//! `MP1_KERNEL_ELF` and `MP1_OBJDUMP` override the defaults. Without a firmware build the tests
//! report that and pass.

use mp1_image::{
    check::{self, Violation},
    disasm::{self, Disassembly},
};
use std::{env, path::PathBuf, process::Command};

fn kernel_elf() -> PathBuf {
    env::var_os("MP1_KERNEL_ELF")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../../target/armv7a-none-eabi/release/kernel")
        })
}

fn objdump() -> String {
    env::var("MP1_OBJDUMP").unwrap_or_else(|_| disasm::DEFAULT_OBJDUMP.to_string())
}

/// The disassembly of the firmware, if there is one to look at.
fn firmware() -> Option<Disassembly> {
    let elf = kernel_elf();
    if !elf.exists() {
        eprintln!("skipped: no firmware at {}", elf.display());
        return None;
    }
    if Command::new(objdump()).arg("--version").output().is_err() {
        eprintln!("skipped: {} not found", objdump());
        return None;
    }

    Some(Disassembly::of_elf(&elf, &objdump()).unwrap())
}

#[test]
fn delete_family_is_never_called() {
    let Some(disassembly) = firmware() else {
        return;
    };

    let calls: Vec<Violation> = check::firmware(&disassembly)
        .into_iter()
        .filter(|violation| matches!(violation, Violation::DeleteCalled(_)))
        .collect();

    assert!(calls.is_empty(), "{:?}", calls);
}

#[test]
fn default_handler_is_stackless() {
    let Some(disassembly) = firmware() else {
        return;
    };

    let handler = disassembly
        .function(check::DEFAULT_HANDLER)
        .expect("default_handler not in the image");
    let mnemonics: Vec<&str> = handler.iter().map(|i| i.mnemonic.as_str()).collect();

    assert_eq!(mnemonics, ["wfe", "b"]);
}
