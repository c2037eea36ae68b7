// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! The `kernel` binary.
//!
//! A small demo application on top of the startup code in `libkernel`.

#![no_main]
#![no_std]

use core::sync::atomic::{AtomicUsize, Ordering};
use libkernel::{bsp, console, cpu, info, init_routine, warn};

/// Lands in `.bss`, gets a value from a static initialization routine.
static INIT_ROUTINE_RUNS: AtomicUsize = AtomicUsize::new(0);

fn count_init_routine_run() {
    INIT_ROUTINE_RUNS.fetch_add(1, Ordering::Relaxed);
}

init_routine!(count_init_routine_run);

/// Busy wait.
/// 何もしない命令をcycles回実行して待つよ．
fn delay(cycles: usize) {
    for _ in 0..cycles {
        cpu::nop();
    }
}

/// Early init code.
///
/// Called by the runtime once `.bss` is zeroed and the static initialization routines ran.
///
/// # Safety
///
/// - Only a single core must be active and running this function.
#[no_mangle]
unsafe fn kernel_init() {
    use console::interface::Statistics;

    info!("{} bare metal demo", bsp::board_name());
    // 静的初期化routineはkernel_initより前にちょうど1回だけ実行されているはず．
    match INIT_ROUTINE_RUNS.load(Ordering::Relaxed) {
        1 => info!("Static initialization routine ran once"),
        runs => warn!("Static initialization routine ran {} times, expected once", runs),
    }

    let mut counter: usize = 0;
    for i in 0..10 {
        counter += i;
        delay(1000);
    }
    info!("Counter: {}", counter);

    info!(
        "Chars written: {}",
        bsp::console::console().chars_written()
    );
    info!("Parking the core");

    cpu::wait_forever()
}
