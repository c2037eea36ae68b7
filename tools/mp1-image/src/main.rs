// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! `mp1-image`: turn the kernel into something the STM32MP135 boot ROM starts.
//!
//! ```text
//! rust-objcopy --strip-all -O binary target/armv7a-none-eabi/release/kernel kernel.bin
//! mp1-image check target/armv7a-none-eabi/release/kernel
//! mp1-image wrap kernel.bin kernel.stm32
//! mp1-image flash kernel.stm32 --device /dev/sdX
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mp1_image::{check, disasm::Disassembly, flash, header};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

/// Link address of the kernel, start of SYSRAM.
const SYSRAM_START: &str = "0x2FFE0000";

#[derive(Debug, Parser)]
#[command(author, version, about = "STM32MP135 boot image tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Put an STM32 header in front of a raw kernel binary.
    Wrap(WrapArgs),
    /// Show and verify the STM32 header of an image.
    Inspect(InspectArgs),
    /// Write an image to an SD card, or a disk image file, at the boot loader offset.
    Flash(FlashArgs),
    /// Check the disassembly of the kernel ELF.
    Check(CheckArgs),
}

#[derive(Debug, Parser)]
struct WrapArgs {
    /// Raw binary, as produced by `objcopy -O binary`.
    input: PathBuf,
    /// Where to write the wrapped image.
    output: PathBuf,
    /// Load address field of the header.
    #[arg(long, value_parser = parse_u32, default_value = SYSRAM_START)]
    load_address: u32,
    /// Entry point field of the header.
    #[arg(long, value_parser = parse_u32, default_value = SYSRAM_START)]
    entry_point: u32,
    /// Binary type field of the header.
    #[arg(long, value_parser = parse_u32, default_value = "0x10")]
    binary_type: u32,
}

#[derive(Debug, Parser)]
struct InspectArgs {
    /// Wrapped image.
    image: PathBuf,
}

#[derive(Debug, Parser)]
struct FlashArgs {
    /// Wrapped image.
    image: PathBuf,
    /// Block device of the SD card, or a disk image file.
    #[arg(long)]
    device: PathBuf,
    /// Byte offset on the device.
    #[arg(long, value_parser = parse_u64, default_value_t = flash::FSBL_OFFSET)]
    offset: u64,
    /// Write even if the image has no valid STM32 header.
    #[arg(long)]
    force: bool,
    /// Do not ask for confirmation.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// The linked kernel ELF.
    elf: PathBuf,
    /// Disassembler to run.
    #[arg(long, default_value = mp1_image::disasm::DEFAULT_OBJDUMP)]
    objdump: String,
}

fn parse_u64(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };

    parsed.map_err(|error| format!("{}: {}", text, error))
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let value = parse_u64(text)?;

    u32::try_from(value).map_err(|_| format!("{} does not fit 32 bit", text))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Wrap(args) => wrap(args),
        Command::Inspect(args) => inspect(args),
        Command::Flash(args) => flash_image(args),
        Command::Check(args) => check_elf(args),
    }
}

fn wrap(args: WrapArgs) -> Result<()> {
    let payload =
        fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let image = header::wrap(
        &payload,
        args.load_address,
        args.entry_point,
        args.binary_type,
    )?;

    fs::write(&args.output, &image).with_context(|| format!("write {}", args.output.display()))?;
    println!(
        "{}: {} byte payload, checksum {:#010x}",
        args.output.display(),
        payload.len(),
        header::checksum(&payload)
    );

    Ok(())
}

fn print_header(header: &header::Header) {
    println!("STM32 header v2.0");
    println!("  Entry:    {:#010x}", header.entry_point);
    println!("  Load:     {:#010x}", header.load_address);
    println!("  Size:     {} bytes", header.image_length);
    println!("  Checksum: {:#010x}", header.checksum);
    println!("  Type:     {:#x}", header.binary_type);
}

fn inspect(args: InspectArgs) -> Result<()> {
    let image = fs::read(&args.image).with_context(|| format!("read {}", args.image.display()))?;
    let header = header::Header::parse(&image)?;

    print_header(&header);

    Ok(())
}

fn confirmed(question: &str) -> Result<bool> {
    print!("{} Type 'yes' to continue: ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(answer.trim() == "yes")
}

fn flash_image(args: FlashArgs) -> Result<()> {
    let image = fs::read(&args.image).with_context(|| format!("read {}", args.image.display()))?;

    match header::Header::parse(&image) {
        Ok(header) => print_header(&header),
        Err(error) if args.force => eprintln!("Warning: {}", error),
        Err(error) => bail!("{}, use --force to write it anyway", error),
    }

    println!(
        "About to write {} bytes to {} at offset {:#x}",
        image.len(),
        args.device.display(),
        args.offset
    );
    if !args.yes && !confirmed("Everything at that offset is overwritten.")? {
        println!("Cancelled.");
        return Ok(());
    }

    flash::write_image(&image, &args.device, args.offset)?;
    println!("Done.");

    Ok(())
}

fn check_elf(args: CheckArgs) -> Result<()> {
    let disassembly = Disassembly::of_elf(&args.elf, &args.objdump)?;
    let violations = check::firmware(&disassembly);

    if violations.is_empty() {
        println!("{}: ok", args.elf.display());
        return Ok(());
    }

    for violation in &violations {
        eprintln!("{}", violation);
    }
    bail!("{}: {} violation(s)", args.elf.display(), violations.len())
}
