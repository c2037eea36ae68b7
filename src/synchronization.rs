// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2020-2022 Andre Richter <andre.o.richter@gmail.com>

//! Synchronization primitives.
//! 同期のための基本的な部品
//!
//! # Resources
//!
//!   - <https://doc.rust-lang.org/book/ch16-04-extensible-concurrency-sync-and-send.html>
//!   - <https://doc.rust-lang.org/std/cell/index.html>

use core::cell::UnsafeCell;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Synchronization interfaces.
/// 同期のinterfaces
pub mod interface {

    /// Any object implementing this trait guarantees exclusive access to the data wrapped within
    /// the Mutex for the duration of the provided closure.
    /// このtraitを実装するobjectは，closureの実行中はMutexでwrapされたdataへの排他的accessを保証する．
    pub trait Mutex {
        /// The type of the data that is wrapped by this mutex.
        /// このmutexでwrapされるdataの型
        type Data;

        /// Locks the mutex and grants the closure temporary mutable access to the wrapped data.
        /// mutexをlockして，closure(f)にwrapされたdataへの一時的なmutable accessを渡す．
        /// fの返り値をそのまま返すよ．
        fn lock<R>(&self, f: impl FnOnce(&mut Self::Data) -> R) -> R;
    }
}

/// A lock that does not lock.
/// 実際には何もlockしないlock
///
/// The Cortex-A7 of the STM32MP135 is the only core, and this runtime never unmasks interrupts.
/// Exclusive access therefore holds as long as nobody calls `lock()` from within its own closure.
/// coreは1つで割り込みも無効なので，closureの中から`lock()`を呼ばない限り排他的accessになるよ．
pub struct NullLock<T>
where
    T: ?Sized, // T型はSizedでなくてもよい
{
    // 共有参照からmutableに借りられるようにUnsafeCellでwrapしている
    data: UnsafeCell<T>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

// NullLock<T>にSend traitとSync traitを実装する
unsafe impl<T> Send for NullLock<T> where T: ?Sized + Send {}
unsafe impl<T> Sync for NullLock<T> where T: ?Sized + Send {}

impl<T> NullLock<T> {
    /// Create an instance.
    /// T型のdataをUnsafeCellでwrapしてさらにNullLockでwrapした実体を返す
    pub const fn new(data: T) -> Self {
        Self {
            data: UnsafeCell::new(data),
        }
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------

impl<T> interface::Mutex for NullLock<T> {
    type Data = T;

    fn lock<R>(&self, f: impl FnOnce(&mut Self::Data) -> R) -> R {
        // Single core, interrupts masked: this is the only mutable reference handed out.
        let data = unsafe { &mut *self.data.get() };

        f(data)
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
