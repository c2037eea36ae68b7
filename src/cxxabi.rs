// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Minimal C++ ABI support.
//! C++のABIのうち最低限必要な部分
//!
//! The handful of routines compiled C++ code calls into that normally come from the C++ runtime
//! library of an operating system:
//!
//! - Virtual dispatch traps (`__cxa_pure_virtual`, `__cxa_deleted_virtual`).
//! - The one-time initialization guards of function-local statics (`__cxa_guard_*`).
//! - Destructor registration of static objects (`__cxa_atexit`, `__aeabi_atexit`).
//! - Placement `new` and the `delete` family.
//!
//! The C symbols are only exported for bare-metal targets. On the build machine the same functions
//! exist under their Rust paths, so the unit tests never clash with a host C++ runtime.
//!
//! # Guards
//!
//! The guard state machine is binary: uninitialized or initialized. The in-progress state is not
//! tracked, which is only sound as long as a single core runs without interrupts while static
//! objects get initialized. A target that takes interrupts before that point needs a real critical
//! section here.

use crate::cpu;
use core::{
    cell::UnsafeCell,
    ffi::{c_int, c_void},
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// The guard word. 32 bit on ARM EABI, 64 bit in the generic Itanium ABI.
#[cfg(target_arch = "arm")]
pub type GuardWord = u32;

/// The guard word. 32 bit on ARM EABI, 64 bit in the generic Itanium ABI.
#[cfg(not(target_arch = "arm"))]
pub type GuardWord = u64;

/// Answer of `Guard::acquire()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Acquire {
    /// Not initialized yet. Run the initializer, then `release()`.
    Proceed,
    /// Already initialized. Skip the initializer.
    Skip,
}

/// One-time initialization guard of a function-local static object.
/// 関数内のstatic objectを1回だけ初期化するためのguard
///
/// Bit 0 set means initialized. This satisfies both the ARM EABI check (`guard & 1`) and the
/// Itanium one (first byte non-zero, little endian) that compilers inline in front of the call to
/// `__cxa_guard_acquire`.
#[repr(transparent)]
pub struct Guard {
    word: UnsafeCell<GuardWord>,
}

/// The heap this runtime does not have.
/// このruntimeにはheapがないよ．
///
/// Nothing can be allocated, so nothing can be released. The release operations exist because C++
/// object destruction names them; each of them is a no-op.
pub struct NoHeap;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

const INITIALIZED: GuardWord = 1;

// Guards are only touched by the single boot core before anything else runs.
unsafe impl Sync for Guard {}

impl Guard {
    /// Create an uninitialized guard.
    pub const fn new() -> Self {
        Self {
            word: UnsafeCell::new(0),
        }
    }

    /// Whether the guarded object was initialized already.
    pub fn is_initialized(&self) -> bool {
        // コンパイラがインライン展開するチェックと同じく，bit 0だけを見るよ．
        unsafe { core::ptr::read_volatile(self.word.get()) & INITIALIZED != 0 }
    }

    /// Start the initialization of the guarded object, unless it is done already.
    /// まだ初期化されていなければProceedを返すよ．
    pub fn acquire(&self) -> Acquire {
        if self.is_initialized() {
            Acquire::Skip
        } else {
            Acquire::Proceed
        }
    }

    /// Mark the guarded object initialized.
    /// 初期化済みの印としてbit 0を立てる
    pub fn release(&self) {
        unsafe { core::ptr::write_volatile(self.word.get(), INITIALIZED) }
    }

    /// Give up on an initialization that was started with `acquire()`.
    ///
    /// The in-progress state is not tracked, so there is nothing to revert. The next `acquire()`
    /// answers `Proceed` again.
    pub fn abort(&self) {}
}

impl NoHeap {
    /// Release a single object.
    pub fn release(&self, _ptr: *mut c_void) {}

    /// Release a single object of known size.
    pub fn release_sized(&self, _ptr: *mut c_void, _size: usize) {}
}

/// Move `value` into already allocated storage, without allocating anything.
/// すでに確保された領域にvalueを置くだけで，新たに確保はしないよ．
///
/// Returns `place` unchanged.
///
/// # Safety
///
/// - `place` must be valid for writes and properly aligned for `T`.
/// - A previous value at `place` is overwritten without being dropped.
pub unsafe fn emplace<T>(place: *mut T, value: T) -> *mut T {
    place.write(value);

    place
}

//------------------------------------------------------------------------------
// Virtual dispatch traps
//------------------------------------------------------------------------------

/// A virtual call resolved to a pure virtual function.
/// 純粋仮想関数が呼ばれたら止まるしかない
///
/// Means an object was used while under construction or destruction, or its layout is broken.
/// Nothing sane can follow.
#[cfg_attr(target_os = "none", no_mangle)]
pub extern "C" fn __cxa_pure_virtual() -> ! {
    cpu::wait_forever()
}

/// A virtual call resolved to a deleted virtual function.
#[cfg_attr(target_os = "none", no_mangle)]
pub extern "C" fn __cxa_deleted_virtual() -> ! {
    cpu::wait_forever()
}

//------------------------------------------------------------------------------
// Guards
//------------------------------------------------------------------------------

/// Returns 1 if the caller must run the initializer, 0 if it ran already.
///
/// # Safety
///
/// - `guard` must point to the guard the compiler emitted for the object.
#[cfg_attr(target_os = "none", no_mangle)]
pub unsafe extern "C" fn __cxa_guard_acquire(guard: *mut Guard) -> c_int {
    match (*guard).acquire() {
        Acquire::Proceed => 1,
        Acquire::Skip => 0,
    }
}

/// # Safety
///
/// - `guard` must point to the guard the compiler emitted for the object.
#[cfg_attr(target_os = "none", no_mangle)]
pub unsafe extern "C" fn __cxa_guard_release(guard: *mut Guard) {
    (*guard).release()
}

/// # Safety
///
/// - `guard` must point to the guard the compiler emitted for the object.
#[cfg_attr(target_os = "none", no_mangle)]
pub unsafe extern "C" fn __cxa_guard_abort(guard: *mut Guard) {
    (*guard).abort()
}

//------------------------------------------------------------------------------
// Destructor registration
//------------------------------------------------------------------------------

/// Handle identifying this image to `__cxa_atexit`. Only its address is ever used.
#[cfg_attr(target_os = "none", no_mangle)]
#[allow(non_upper_case_globals)]
pub static __dso_handle: u8 = 0;

/// Static objects are never destroyed because the program never exits. Accept and forget.
/// programは終了しないので，static objectのdestructorは登録だけして忘れるよ．
#[cfg_attr(target_os = "none", no_mangle)]
pub extern "C" fn __cxa_atexit(
    _destructor: Option<unsafe extern "C" fn(*mut c_void)>,
    _object: *mut c_void,
    _dso_handle: *mut c_void,
) -> c_int {
    0
}

/// ARM EABI flavor of `__cxa_atexit()`, with the first two arguments swapped.
#[cfg_attr(target_os = "none", no_mangle)]
pub extern "C" fn __aeabi_atexit(
    object: *mut c_void,
    destructor: Option<unsafe extern "C" fn(*mut c_void)>,
    dso_handle: *mut c_void,
) -> c_int {
    __cxa_atexit(destructor, object, dso_handle)
}

//------------------------------------------------------------------------------
// Placement new
//------------------------------------------------------------------------------

/// `operator new(size_t, void*)`.
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "32"),
    export_name = "_ZnwjPv"
)]
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "64"),
    export_name = "_ZnwmPv"
)]
pub extern "C" fn placement_new(_size: usize, place: *mut c_void) -> *mut c_void {
    place
}

/// `operator new[](size_t, void*)`.
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "32"),
    export_name = "_ZnajPv"
)]
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "64"),
    export_name = "_ZnamPv"
)]
pub extern "C" fn placement_new_array(_size: usize, place: *mut c_void) -> *mut c_void {
    place
}

//------------------------------------------------------------------------------
// Delete family
//------------------------------------------------------------------------------

/// `operator delete(void*)`.
#[cfg_attr(target_os = "none", export_name = "_ZdlPv")]
pub extern "C" fn operator_delete(ptr: *mut c_void) {
    NoHeap.release(ptr)
}

/// `operator delete[](void*)`.
#[cfg_attr(target_os = "none", export_name = "_ZdaPv")]
pub extern "C" fn operator_delete_array(ptr: *mut c_void) {
    NoHeap.release(ptr)
}

/// `operator delete(void*, size_t)`.
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "32"),
    export_name = "_ZdlPvj"
)]
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "64"),
    export_name = "_ZdlPvm"
)]
pub extern "C" fn operator_delete_sized(ptr: *mut c_void, size: usize) {
    NoHeap.release_sized(ptr, size)
}

/// `operator delete[](void*, size_t)`.
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "32"),
    export_name = "_ZdaPvj"
)]
#[cfg_attr(
    all(target_os = "none", target_pointer_width = "64"),
    export_name = "_ZdaPvm"
)]
pub extern "C" fn operator_delete_array_sized(ptr: *mut c_void, size: usize) {
    NoHeap.release_sized(ptr, size)
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;

    #[test]
    fn fresh_guard_proceeds() {
        let guard = Guard::new();

        assert!(!guard.is_initialized());
        assert_eq!(guard.acquire(), Acquire::Proceed);
    }

    #[test]
    fn released_guard_skips() {
        let guard = Guard::new();

        assert_eq!(guard.acquire(), Acquire::Proceed);
        guard.release();

        assert!(guard.is_initialized());
        assert_eq!(guard.acquire(), Acquire::Skip);
        assert_eq!(guard.acquire(), Acquire::Skip);
    }

    #[test]
    fn aborted_guard_proceeds_again() {
        let guard = Guard::new();

        assert_eq!(guard.acquire(), Acquire::Proceed);
        guard.abort();

        assert_eq!(guard.acquire(), Acquire::Proceed);
        guard.release();
        assert_eq!(guard.acquire(), Acquire::Skip);
    }

    /// What a function-local static does: the initializer runs once, however often the function is
    /// entered.
    #[test]
    fn initializer_runs_exactly_once() {
        static GUARD: Guard = Guard::new();
        static mut RUNS: usize = 0;

        fn enter() {
            let guard = &GUARD as *const Guard as *mut Guard;
            unsafe {
                if __cxa_guard_acquire(guard) == 1 {
                    RUNS += 1;
                    __cxa_guard_release(guard);
                }
            }
        }

        for _ in 0..5 {
            enter();
        }

        assert_eq!(unsafe { RUNS }, 1);
    }

    /// The guard word the compiler emits is all-zero; the initialized mark is bit 0.
    #[test]
    fn guard_word_layout() {
        let guard = Guard::new();
        let word = guard.word.get();

        assert_eq!(core::mem::size_of::<Guard>(), core::mem::size_of::<GuardWord>());
        assert_eq!(unsafe { *word }, 0);

        guard.release();
        assert_eq!(unsafe { *word } & 1, 1);
        assert_ne!(unsafe { *(word as *const u8) }, 0);
    }

    #[test]
    fn placement_returns_the_address_unchanged() {
        let mut storage = [0_u64; 8];
        let base = storage.as_mut_ptr() as *mut c_void;

        for size in [0, 1, 8, 64, usize::MAX] {
            for offset in 0..8 {
                let place = unsafe { (base as *mut u64).add(offset) } as *mut c_void;

                assert_eq!(placement_new(size, place), place);
                assert_eq!(placement_new_array(size, place), place);
            }
        }

        assert_eq!(placement_new(16, ptr::null_mut()), ptr::null_mut());
        assert_eq!(storage, [0; 8]);
    }

    #[test]
    fn emplace_constructs_in_place() {
        let mut slot = core::mem::MaybeUninit::<(u32, u16)>::uninit();
        let place = slot.as_mut_ptr();

        let constructed = unsafe { emplace(place, (0xCAFE, 7)) };

        assert_eq!(constructed, place);
        assert_eq!(unsafe { slot.assume_init() }, (0xCAFE, 7));
    }

    /// None of the release entry points touches memory.
    #[test]
    fn delete_family_is_a_no_op() {
        let mut object = [0x5A_u8; 32];
        let ptr = object.as_mut_ptr() as *mut c_void;

        operator_delete(ptr);
        operator_delete_array(ptr);
        operator_delete_sized(ptr, object.len());
        operator_delete_array_sized(ptr, object.len());
        operator_delete(ptr::null_mut());
        operator_delete_sized(ptr::null_mut(), 0);

        assert_eq!(object, [0x5A; 32]);
    }

    #[test]
    fn destructor_registration_is_accepted() {
        unsafe extern "C" fn destructor(_object: *mut c_void) {
            panic!("static objects are never destroyed");
        }

        let handle = &__dso_handle as *const u8 as *mut c_void;

        assert_eq!(__cxa_atexit(Some(destructor), ptr::null_mut(), handle), 0);
        assert_eq!(__aeabi_atexit(ptr::null_mut(), Some(destructor), handle), 0);
    }
}
