// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! STM32 USART/UART driver, transmit side only.
//!
//! # Resources
//!
//! - RM0475, STM32MP13xx reference manual, USART chapter.
//!
//! Clocks, pins and the baud rate belong to the previous boot stage. Without an enabled
//! transmitter, output is dropped instead of waiting on a flag that never comes.

use super::super::common::MMIODerefWrapper;
use crate::{console, cpu, synchronization, synchronization::NullLock};
use core::fmt;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_bitfields, register_structs,
    registers::{ReadOnly, ReadWrite},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_bitfields! {
    u32,

    /// Control register 1
    CR1 [
        /// Transmitter enable
        TE OFFSET(3) NUMBITS(1) [],

        /// USART enable
        UE OFFSET(0) NUMBITS(1) []
    ],

    /// Interrupt and status register
    ISR [
        /// Transmit data register empty (TX FIFO not full with FIFO mode on)
        TXE OFFSET(7) NUMBITS(1) [],

        /// Transmission complete
        TC OFFSET(6) NUMBITS(1) []
    ],

    /// Transmit data register
    TDR [
        DATA OFFSET(0) NUMBITS(9) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    pub RegisterBlock {
        (0x00 => CR1: ReadWrite<u32, CR1::Register>),
        (0x04 => _reserved1),
        (0x1C => ISR: ReadOnly<u32, ISR::Register>),
        (0x20 => _reserved2),
        (0x28 => TDR: ReadWrite<u32, TDR::Register>),
        (0x2C => @END),
    }
}

/// Abstraction for the associated MMIO registers.
type Registers = MMIODerefWrapper<RegisterBlock>;

struct StmUsartInner {
    registers: Registers,
    chars_written: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of the USART.
/// USARTを表す構造体
pub struct StmUsart {
    inner: NullLock<StmUsartInner>,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

impl StmUsartInner {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            registers: Registers::new(mmio_start_addr),
            chars_written: 0,
        }
    }

    fn transmitter_enabled(&self) -> bool {
        self.registers.CR1.is_set(CR1::UE) && self.registers.CR1.is_set(CR1::TE)
    }

    /// Send a character.
    /// 1文字送信する
    fn write_char(&mut self, c: char) {
        if !self.transmitter_enabled() {
            return;
        }

        // Spin while the TX data register (or FIFO) is full.
        // 送信data register(またはFIFO)が空くまで待つよ．
        while !self.registers.ISR.is_set(ISR::TXE) {
            cpu::nop();
        }

        self.registers.TDR.write(TDR::DATA.val(c as u32));

        self.chars_written += 1;
    }

    /// Block execution until the last character has been physically put on the TX wire.
    fn flush(&self) {
        if !self.transmitter_enabled() {
            return;
        }

        while !self.registers.ISR.is_set(ISR::TC) {
            cpu::nop();
        }
    }
}

/// Implementing `core::fmt::Write` enables usage of the `format_args!` macros, which in turn are
/// used to implement the `kernel`'s `print!` and `println!` macros. By implementing `write_str()`,
/// we get `write_fmt()` automatically.
///
/// The function takes an `&mut self`, so it must be implemented for the inner struct.
///
/// See [`src/print.rs`].
///
/// [`src/print.rs`]: ../../print/index.html
impl fmt::Write for StmUsartInner {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            // Convert newline to carrige return + newline.
            // 改行をCR+LFに変換する
            if c == '\n' {
                self.write_char('\r')
            }

            self.write_char(c);
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl StmUsart {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    pub const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            inner: NullLock::new(StmUsartInner::new(mmio_start_addr)),
        }
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------
use synchronization::interface::Mutex;

impl console::interface::Write for StmUsart {
    /// Passthrough of `args` to the `core::fmt::Write` implementation, but guarded by a Mutex to
    /// serialize access.
    fn write_fmt(&self, args: core::fmt::Arguments) -> fmt::Result {
        // Fully qualified syntax for the call to `core::fmt::Write::write_fmt()` to increase
        // readability.
        self.inner.lock(|inner| fmt::Write::write_fmt(inner, args))
    }

    fn flush(&self) {
        self.inner.lock(|inner| inner.flush());
    }
}

impl console::interface::Statistics for StmUsart {
    fn chars_written(&self) -> usize {
        self.inner.lock(|inner| inner.chars_written)
    }
}

impl console::interface::All for StmUsart {}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
