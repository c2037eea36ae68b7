// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Rust runtime initialization code.
//! Rustの実行時初期化code
//!
//! Equivalent to `crt0` in the C/C++ world. The steps below run strictly in order, each one a
//! precondition of the next:
//! C/C++でいう`crt0`に相当するよ．以下の手順を必ずこの順番で実行する．
//!
//! 1. Zero-fill `.bss`.
//! 2. With `relocate_data`, copy the `.data` image from its load address to its run address.
//! 3. Call every routine of `.init_array`, in table order, exactly once.
//! 4. Call the application entry point.
//! 5. Should the entry point return, park the core for good.

use crate::{cpu, memory};
use core::ops::Range;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// A static initialization routine, as the compiler emits it into `.init_array`.
/// compilerが`.init_array`に置く静的初期化routine
pub type InitRoutine = unsafe extern "C" fn();

/// Copy of the initialized data image from where it was loaded to where it runs.
/// 初期値付きdataをload先から実行先へcopyするための情報
pub struct DataRelocation {
    pub load: *const u32,
    pub run: Range<*mut u32>,
}

/// What the runtime operates on.
/// linker scriptが決めるimageの各領域
pub struct RuntimeImage<'a> {
    pub bss: Range<*mut u32>,
    pub data: Option<DataRelocation>,
    pub init_array: &'a [InitRoutine],
}

/// Register a function as static initialization routine.
/// 関数を静的初期化routineとして`.init_array`に登録するよ．
///
/// The function runs after `.bss` is zeroed and before `kernel_init()`, in link order relative to
/// the other registered routines.
#[macro_export]
macro_rules! init_routine {
    ($func:path) => {
        const _: () = {
            #[link_section = ".init_array"]
            #[used]
            static INIT_ROUTINE: $crate::runtime_init::InitRoutine = {
                unsafe extern "C" fn init_routine_trampoline() {
                    $func()
                }

                init_routine_trampoline
            };
        };
    };
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// Zero out the .bss section.
///
/// # Safety
///
/// - Must only be called pre `kernel_init()`, and before any static initialization routine.
#[inline(always)]
unsafe fn zero_bss(bss: Range<*mut u32>) {
    memory::zero_volatile(bss);
}

/// Copy `.data` from its load address to its run address.
///
/// # Safety
///
/// - Same as `zero_bss()`.
#[inline(always)]
unsafe fn relocate_data(data: &DataRelocation) {
    // すでに実行addressにloadされているならcopyしないよ．
    if data.load == data.run.start as *const u32 {
        return;
    }

    memory::copy_volatile(data.load, data.run.clone());
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Call every static initialization routine in table order.
/// tableの順番で静的初期化routineを1回ずつ呼ぶよ．
///
/// # Safety
///
/// - Every entry must be a valid routine that expects `.bss` to be zeroed already.
/// - Must only be called once.
pub unsafe fn run_init_array(init_array: &[InitRoutine]) {
    for routine in init_array {
        routine();
    }
}

/// Bring up the runtime described by `image`, then hand off to `entry`.
/// imageの初期化をして，entryに処理を渡すよ．
///
/// # Safety
///
/// - Only a single core must be active and running this function.
/// - All ranges of `image` must be valid and must not overlap the stack of the caller.
pub unsafe fn runtime_start(image: &RuntimeImage, entry: unsafe fn()) -> ! {
    zero_bss(image.bss.clone());

    if let Some(data) = &image.data {
        relocate_data(data);
    }

    run_init_array(image.init_array);

    entry();

    // kernel_initから戻ってくることはないはず．戻ってきたら止まるよ．
    cpu::wait_forever()
}

/// Equivalent to `crt0` or `c0` code in C/C++ world. Clears the `bss` section, runs the static
/// initializers, then jumps to kernel init code.
///
/// # Safety
///
/// - Only a single core must be active and running this function.
#[cfg(target_os = "none")]
pub unsafe fn runtime_init() -> ! {
    extern "Rust" {
        fn kernel_init();
    }

    runtime_start(&crate::bsp::memory::runtime_image(), kernel_init)
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Condvar, Mutex,
        },
        thread,
        time::Duration,
    };

    /// How long a test waits for the runtime thread to reach its entry point.
    const ENTRY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Where the routines of a test leave their traces.
    struct Observations {
        events: Mutex<Vec<&'static str>>,
        entered: Mutex<bool>,
        entry_reached: Condvar,
        bss: AtomicUsize,
        bss_len: AtomicUsize,
    }

    impl Observations {
        const fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                entered: Mutex::new(false),
                entry_reached: Condvar::new(),
                bss: AtomicUsize::new(0),
                bss_len: AtomicUsize::new(0),
            }
        }

        fn push(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }

        /// Called by the entry point of a test.
        fn enter(&self) {
            *self.entered.lock().unwrap() = true;
            self.entry_reached.notify_all();
        }

        /// Block until the entry point ran.
        fn wait_for_entry(&self) {
            let entered = self.entered.lock().unwrap();
            let (entered, _) = self
                .entry_reached
                .wait_timeout_while(entered, ENTRY_TIMEOUT, |entered| !*entered)
                .unwrap();

            assert!(*entered, "entry point not reached");
        }

        fn bss_is_zero(&self) -> bool {
            let start = self.bss.load(Ordering::SeqCst) as *const u32;
            let len = self.bss_len.load(Ordering::SeqCst);

            unsafe { core::slice::from_raw_parts(start, len) }
                .iter()
                .all(|word| *word == 0)
        }
    }

    /// Spawn the full runtime on a thread of its own, the way the core would run it.
    fn boot(
        bss: &'static mut [u32],
        data: Option<(&'static [u32], &'static mut [u32])>,
        init_array: &'static [InitRoutine],
        entry: unsafe fn(),
    ) -> thread::JoinHandle<()> {
        let bss = (bss.as_mut_ptr() as usize, bss.len());
        let data = data.map(|(load, run)| {
            assert_eq!(load.len(), run.len());
            (load.as_ptr() as usize, run.as_mut_ptr() as usize, run.len())
        });

        thread::spawn(move || unsafe {
            let bss_start = bss.0 as *mut u32;
            let image = RuntimeImage {
                bss: bss_start..bss_start.add(bss.1),
                data: data.map(|(load, run, len)| {
                    let run = run as *mut u32;
                    DataRelocation {
                        load: load as *const u32,
                        run: run..run.add(len),
                    }
                }),
                init_array,
            };

            runtime_start(&image, entry)
        })
    }

    //----------------------------------------------------------------------------------------------

    static ORDER: Observations = Observations::new();

    unsafe extern "C" fn order_0() {
        ORDER.push("init 0");
    }

    unsafe extern "C" fn order_1() {
        ORDER.push("init 1");
    }

    unsafe extern "C" fn order_2() {
        ORDER.push("init 2");
    }

    unsafe fn order_entry() {
        ORDER.push("entry");
        ORDER.enter();
    }

    /// Routines run in table order, exactly once each, and all before the entry point.
    #[test]
    fn init_routines_run_in_order_before_entry() {
        static TABLE: [InitRoutine; 3] = [order_0, order_1, order_2];
        let bss = Box::leak(Box::new([1_u32; 8]));

        let _runtime = boot(bss, None, &TABLE, order_entry);
        ORDER.wait_for_entry();

        assert_eq!(ORDER.events(), ["init 0", "init 1", "init 2", "entry"]);
    }

    //----------------------------------------------------------------------------------------------

    static ZERO_FIRST: Observations = Observations::new();

    unsafe extern "C" fn check_bss() {
        if ZERO_FIRST.bss_is_zero() {
            ZERO_FIRST.push("bss zero");
        } else {
            ZERO_FIRST.push("bss dirty");
        }
    }

    unsafe fn zero_first_entry() {
        check_bss();
        ZERO_FIRST.enter();
    }

    /// Every word of the zero-fill range reads as zero before the first routine runs.
    #[test]
    fn bss_is_zero_before_init_routines() {
        static TABLE: [InitRoutine; 1] = [check_bss];
        let bss = Box::leak(Box::new([0xFFFF_FFFF_u32; 256]));
        ZERO_FIRST.bss.store(bss.as_ptr() as usize, Ordering::SeqCst);
        ZERO_FIRST.bss_len.store(bss.len(), Ordering::SeqCst);

        let _runtime = boot(bss, None, &TABLE, zero_first_entry);
        ZERO_FIRST.wait_for_entry();

        assert_eq!(ZERO_FIRST.events(), ["bss zero", "bss zero"]);
    }

    //----------------------------------------------------------------------------------------------

    static RETURNING: Observations = Observations::new();
    static ENTRY_CALLS: AtomicUsize = AtomicUsize::new(0);
    static ENTRY_RETURNED: AtomicBool = AtomicBool::new(false);

    unsafe fn returning_entry() {
        ENTRY_CALLS.fetch_add(1, Ordering::SeqCst);
        RETURNING.enter();
        ENTRY_RETURNED.store(true, Ordering::SeqCst);
    }

    /// An entry point that returns leaves the runtime parked for good.
    #[test]
    fn returning_entry_ends_in_wait_forever() {
        let bss = Box::leak(Box::new([0_u32; 4]));

        let runtime = boot(bss, None, &[], returning_entry);
        RETURNING.wait_for_entry();

        // The thread is parked for good, so only a bounded wait can show it never finishes.
        while !ENTRY_RETURNED.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        thread::sleep(Duration::from_millis(100));

        assert_eq!(ENTRY_CALLS.load(Ordering::SeqCst), 1);
        assert!(!runtime.is_finished());
    }

    //----------------------------------------------------------------------------------------------

    static RELOCATION: Observations = Observations::new();
    static RELOCATED_AT: AtomicUsize = AtomicUsize::new(0);
    static RELOCATED_SEEN: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    unsafe extern "C" fn read_relocated() {
        let run = RELOCATED_AT.load(Ordering::SeqCst) as *const u32;
        let seen = (0..4).map(|i| run.add(i).read_volatile()).collect();

        *RELOCATED_SEEN.lock().unwrap() = seen;
    }

    unsafe fn relocation_entry() {
        RELOCATION.enter();
    }

    /// The data image is in place by the time the initializers run.
    #[test]
    fn data_relocated_before_init_routines() {
        static TABLE: [InitRoutine; 1] = [read_relocated];
        static LOAD_IMAGE: [u32; 4] = [10, 20, 30, 40];
        let run: &'static mut [u32] = Box::leak(Box::new([0_u32; 4]));
        let bss = Box::leak(Box::new([5_u32; 4]));
        RELOCATED_AT.store(run.as_ptr() as usize, Ordering::SeqCst);

        let _runtime = boot(bss, Some((&LOAD_IMAGE[..], run)), &TABLE, relocation_entry);
        RELOCATION.wait_for_entry();

        assert_eq!(*RELOCATED_SEEN.lock().unwrap(), [10, 20, 30, 40]);
    }

    /// An image that already runs where it was loaded is left alone.
    #[test]
    fn data_loaded_in_place_is_not_copied() {
        let mut data = [1_u32, 2, 3, 4];
        let run = data.as_mut_ptr_range();
        let relocation = DataRelocation {
            load: run.start as *const u32,
            run,
        };

        unsafe { relocate_data(&relocation) };

        assert_eq!(data, [1, 2, 3, 4]);
    }

    #[test]
    fn empty_init_array_is_fine() {
        unsafe { run_init_array(&[]) };
    }
}
