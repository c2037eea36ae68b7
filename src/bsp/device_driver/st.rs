// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! ST peripherals.

mod stm32_usart;

pub use stm32_usart::*;
