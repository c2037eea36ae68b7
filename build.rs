// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

use std::{env, fs, io, path::PathBuf};

/// Where `.data` runs. With `relocate_data`, the runtime copies it from SYSRAM to SRAM.
fn data_region_script() -> &'static str {
    if env::var_os("CARGO_FEATURE_RELOCATE_DATA").is_some() {
        "REGION_ALIAS(\"DATA_RUN\", SRAM);\n"
    } else {
        "REGION_ALIAS(\"DATA_RUN\", SYSRAM);\n"
    }
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (unit tests) link against the system toolchain and need no script.
    let bare_metal = env::var("CARGO_CFG_TARGET_OS").map_or(false, |os| os == "none");
    if env::var_os("CARGO_FEATURE_BSP_STM32MP135").is_none() || !bare_metal {
        return Ok(());
    }

    let (manifest_dir, out_dir) = match (env::var_os("CARGO_MANIFEST_DIR"), env::var_os("OUT_DIR")) {
        (Some(manifest_dir), Some(out_dir)) => (PathBuf::from(manifest_dir), PathBuf::from(out_dir)),
        _ => return Ok(()),
    };
    let script = manifest_dir.join("src/bsp/stm32mp135/kernel.ld");

    // kernel.ldがINCLUDEするfileをOUT_DIRに書いて，linkerの検索pathに加えるよ．
    fs::write(out_dir.join("data_region.ld"), data_region_script())?;

    println!("cargo:rerun-if-changed={}", script.display());
    println!("cargo:rustc-link-search=native={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--script={}", script.display());

    Ok(())
}
