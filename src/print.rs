// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Printing.
//! 文字の出力

use crate::{bsp, console};
use core::fmt;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use console::interface::Write;

    // The console has no way to report failure other than dropping output.
    // consoleは失敗を出力を捨てることでしか表せないので，結果は無視するよ．
    let _ = bsp::console::console().write_fmt(args);
}

/// Prints without a newline.
/// 改行なしで出力する
///
/// Carbon copy from <https://doc.rust-lang.org/src/std/macros.rs.html>
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::print::_print(format_args!($($arg)*)));
}

/// Prints with a newline.
/// 改行ありで出力する
///
/// Carbon copy from <https://doc.rust-lang.org/src/std/macros.rs.html>
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($string:expr) => ($crate::print::_print(format_args!(concat!($string, "\n"))));
    ($format_string:expr, $($arg:tt)*) => ({
        $crate::print::_print(format_args!(concat!($format_string, "\n"), $($arg)*));
    })
}

/// Prints an info, with a newline.
/// "[INFO] "を付けて出力するよ．
#[macro_export]
macro_rules! info {
    ($string:expr) => ({
        $crate::print::_print(format_args!(concat!("[INFO] ", $string, "\n")));
    });
    ($format_string:expr, $($arg:tt)*) => ({
        $crate::print::_print(format_args!(concat!("[INFO] ", $format_string, "\n"), $($arg)*));
    })
}

/// Prints a warning, with a newline.
/// "[WARN] "を付けて出力するよ．
#[macro_export]
macro_rules! warn {
    ($string:expr) => ({
        $crate::print::_print(format_args!(concat!("[WARN] ", $string, "\n")));
    });
    ($format_string:expr, $($arg:tt)*) => ({
        $crate::print::_print(format_args!(concat!("[WARN] ", $format_string, "\n"), $($arg)*));
    })
}
