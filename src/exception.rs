// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2020-2022 Andre Richter <andre.o.richter@gmail.com>

//! Exception vectors.
//! 例外vector
//!
//! The vector table is a fixed array of handler addresses, one per exception class, built at
//! compile time and placed by the linker script. It is read by hardware only.
//! vector tableは例外の種類ごとにhandlerのaddressを並べた固定長の配列．
//! compile時に作られて，linker scriptで配置されるよ．読むのはhardwareだけ．

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[path = "_arch/arm/exception.rs"]
mod arch_exception;

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[path = "_arch/host/exception.rs"]
mod arch_exception;

//--------------------------------------------------------------------------------------------------
// Architectural Public Reexports
//--------------------------------------------------------------------------------------------------
pub use arch_exception::default_handler;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use arch_exception::install_vector_base;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Number of entries in the vector table.
pub const NUM_VECTORS: usize = 8;

/// Address of a handler as stored in the vector table.
/// vector tableに入るhandlerのaddress
///
/// Function pointers cannot be null, so no entry of a table can be left unset.
/// 関数pointerはnullにならないので，設定し忘れたentryは作れないよ．
pub type Vector = unsafe extern "C" fn() -> !;

/// Exception classes of the ARMv7-A core, in vector order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExceptionClass {
    Reset,
    UndefinedInstruction,
    SupervisorCall,
    PrefetchAbort,
    DataAbort,
    Reserved,
    Irq,
    Fiq,
}

/// The vector table.
#[repr(C)]
pub struct VectorTable {
    entries: [Vector; NUM_VECTORS],
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl ExceptionClass {
    /// All classes, indexed by vector number.
    pub const ALL: [ExceptionClass; NUM_VECTORS] = [
        ExceptionClass::Reset,
        ExceptionClass::UndefinedInstruction,
        ExceptionClass::SupervisorCall,
        ExceptionClass::PrefetchAbort,
        ExceptionClass::DataAbort,
        ExceptionClass::Reserved,
        ExceptionClass::Irq,
        ExceptionClass::Fiq,
    ];

    /// The vector number.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl VectorTable {
    /// Create a table with `reset` at entry 0 and the default handler everywhere else.
    /// entry 0にreset，それ以外にdefault handlerを入れたtableを作るよ．
    pub const fn new(reset: Vector) -> Self {
        let mut entries = [default_handler as Vector; NUM_VECTORS];
        entries[ExceptionClass::Reset.index()] = reset;

        Self { entries }
    }

    /// Route `class` to `handler` instead of the default handler.
    ///
    /// The reset entry is fixed by `new()`. Asking for it fails compile-time evaluation.
    /// resetのentryは`new()`で決まるので，ここで変えようとするとcompile時に失敗するよ．
    pub const fn with_handler(mut self, class: ExceptionClass, handler: Vector) -> Self {
        assert!(
            !matches!(class, ExceptionClass::Reset),
            "The reset entry can only be set at construction"
        );
        self.entries[class.index()] = handler;

        self
    }

    /// The handler for `class`.
    pub fn entry(&self, class: ExceptionClass) -> Vector {
        self.entries[class.index()]
    }

    /// The raw entries, as the core reads them.
    pub fn addresses(&self) -> [usize; NUM_VECTORS] {
        self.entries.map(|vector| vector as *const () as usize)
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
