// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Disassembly of the firmware ELF.
//! firmwareのELFを逆assembleした結果を読むよ．
//!
//! Runs `llvm-objdump` (by default through the `rust-objdump` wrapper of `cargo-binutils`) and
//! splits its output into functions and instructions.

use anyhow::{bail, Context, Result};
use std::{collections::BTreeMap, path::Path, process::Command};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

const CONDITION_CODES: [&str; 17] = [
    "eq", "ne", "cs", "hs", "cc", "lo", "mi", "pl", "vs", "vc", "hi", "ls", "ge", "lt", "gt", "le",
    "al",
];

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Default disassembler.
pub const DEFAULT_OBJDUMP: &str = "rust-objdump";

/// One disassembled instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub address: u64,
    pub mnemonic: String,
    pub operands: String,
}

/// A branch from `caller` to `target`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BranchSite {
    pub caller: String,
    pub address: u64,
    pub target: String,
}

/// Instructions, grouped by the symbol they belong to.
#[derive(Debug, Default)]
pub struct Disassembly {
    functions: BTreeMap<String, Vec<Instruction>>,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// `2ffe0fa0 <default_handler>:`
fn parse_symbol_line(line: &str) -> Option<String> {
    let (address, rest) = line.split_once(' ')?;
    u64::from_str_radix(address, 16).ok()?;

    let name = rest.strip_prefix('<')?.strip_suffix(">:")?;

    Some(name.to_string())
}

/// `2ffe0fa0:      	push	{r11, lr}`
fn parse_instruction_line(line: &str) -> Option<Instruction> {
    let (address, rest) = line.trim_start().split_once(':')?;
    let address = u64::from_str_radix(address, 16).ok()?;

    let rest = rest.trim();
    let (mnemonic, operands) = match rest.split_once(char::is_whitespace) {
        Some((mnemonic, operands)) => (mnemonic, operands.trim()),
        None => (rest, ""),
    };
    if mnemonic.is_empty() {
        return None;
    }

    Some(Instruction {
        address,
        mnemonic: mnemonic.to_string(),
        operands: operands.to_string(),
    })
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl Instruction {
    /// `b`, `bl`, `blx` and `bx`, with or without a condition code.
    pub fn is_branch(&self) -> bool {
        let mnemonic = self.mnemonic.split('.').next().unwrap_or("");

        ["blx", "bl", "bx", "b"].iter().any(|base| {
            mnemonic
                .strip_prefix(base)
                .map_or(false, |condition| {
                    condition.is_empty() || CONDITION_CODES.contains(&condition)
                })
        })
    }

    /// The symbol objdump annotates the operand with, without an offset: `<_ZdlPv+0x4>` gives
    /// `_ZdlPv`.
    pub fn target_symbol(&self) -> Option<&str> {
        let start = self.operands.rfind('<')?;
        let end = self.operands.rfind('>')?;
        let symbol = self.operands.get(start + 1..end)?;

        symbol.split('+').next()
    }
}

impl Disassembly {
    /// Split objdump output into functions.
    pub fn parse(text: &str) -> Self {
        let mut functions: BTreeMap<String, Vec<Instruction>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            if let Some(name) = parse_symbol_line(line) {
                functions.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            // シンボルに属さない行(sectionの見出しなど)は読み飛ばすよ．
            let (Some(name), Some(instruction)) = (&current, parse_instruction_line(line)) else {
                continue;
            };
            if let Some(instructions) = functions.get_mut(name) {
                instructions.push(instruction);
            }
        }

        Self { functions }
    }

    /// Disassemble the ELF at `elf` with `objdump`.
    pub fn of_elf(elf: &Path, objdump: &str) -> Result<Self> {
        let output = Command::new(objdump)
            .args(["--disassemble", "--no-show-raw-insn"])
            .arg(elf)
            .output()
            .with_context(|| format!("run {}", objdump))?;

        if !output.status.success() {
            bail!(
                "{} failed on {}: {}",
                objdump,
                elf.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let text = String::from_utf8(output.stdout).context("objdump output is not UTF-8")?;

        Ok(Self::parse(&text))
    }

    /// The instructions of `name`, if the image has that symbol.
    pub fn function(&self, name: &str) -> Option<&[Instruction]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    /// Every branch whose target is one of `targets`.
    pub fn branches_to(&self, targets: &[&str]) -> Vec<BranchSite> {
        self.functions
            .iter()
            .flat_map(|(caller, instructions)| {
                instructions.iter().filter_map(move |instruction| {
                    let target = instruction.target_symbol()?;

                    (instruction.is_branch() && targets.contains(&target)).then(|| BranchSite {
                        caller: caller.clone(),
                        address: instruction.address,
                        target: target.to_string(),
                    })
                })
            })
            .collect()
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
