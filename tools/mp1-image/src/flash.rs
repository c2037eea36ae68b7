// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Writing a wrapped image to an SD card.
//! SD cardにimageを書き込むよ．

use anyhow::{Context, Result};
use std::{
    fs::OpenOptions,
    io::{Seek, SeekFrom, Write},
    path::Path,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Byte offset of the first partition behind a GPT with the usual 128 entries (LBA 34), where the
/// boot ROM finds the first stage boot loader.
pub const FSBL_OFFSET: u64 = 0x4400;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Write `image` to `device` at `offset` and wait until it is on the medium.
///
/// `device` is a block device or an existing disk image file. Nothing outside of
/// `offset..offset + image.len()` changes.
pub fn write_image(image: &[u8], device: &Path, offset: u64) -> Result<()> {
    // 既存のdeviceやfileに書くだけなので，作成も切り詰めもしないよ．
    let mut target = OpenOptions::new()
        .write(true)
        .open(device)
        .with_context(|| format!("open {}", device.display()))?;

    target
        .seek(SeekFrom::Start(offset))
        .with_context(|| format!("seek to {:#x} on {}", offset, device.display()))?;
    target
        .write_all(image)
        .with_context(|| format!("write {} bytes to {}", image.len(), device.display()))?;
    target
        .sync_all()
        .with_context(|| format!("sync {}", device.display()))?;

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
