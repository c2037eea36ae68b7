// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! Memory Management.
//! memory管理

use core::ops::Range;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// A statically allocated execution stack.
/// 静的に確保される実行stack
///
/// The AAPCS demands 8 byte stack alignment at public interfaces.
/// AAPCSでは関数の境界でstackが8 byte alignされている必要があるよ．
#[repr(C, align(8))]
pub struct BootStack<const SIZE: usize>([u8; SIZE]);

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<const SIZE: usize> BootStack<SIZE> {
    /// Create an instance.
    /// 大きさが0か8の倍数でなければcompile時に失敗するよ．
    pub const fn new() -> Self {
        assert!(SIZE > 0 && SIZE % 8 == 0);

        Self([0; SIZE])
    }

}

/// Zero out a memory range.
/// メモリ領域[range.start, range.end)を0で初期化するよ．endは含まないよ．
///
/// # Safety
///
/// - `range.start` and `range.end` must be valid.
/// - `range.start` and `range.end` must be `T` aligned.
pub unsafe fn zero_volatile<T>(range: Range<*mut T>)
where
    T: From<u8>,
{
    let mut ptr = range.start;

    while ptr < range.end {
        // write_volatileは最適化でmemsetに置き換えられないwrite
        core::ptr::write_volatile(ptr, T::from(0));
        ptr = ptr.offset(1);
    }
}

/// Copy `dst.len()` elements from `src` into the range `dst`.
/// srcから範囲dstへ要素をcopyするよ．srcとdstが重なっていてはいけない．
///
/// # Safety
///
/// - `src` must be valid for as many reads as `dst` has elements.
/// - `dst.start` and `dst.end` must be valid.
/// - All pointers must be `T` aligned and the source must not overlap the destination.
pub unsafe fn copy_volatile<T>(mut src: *const T, dst: Range<*mut T>)
where
    T: Copy,
{
    let mut ptr = dst.start;

    while ptr < dst.end {
        core::ptr::write_volatile(ptr, core::ptr::read_volatile(src));
        ptr = ptr.offset(1);
        src = src.offset(1);
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(buffer: &mut [u32]) -> Range<*mut u32> {
        buffer.as_mut_ptr_range()
    }

    #[test]
    fn zero_volatile_clears_every_word() {
        let mut buffer = [0xDEAD_BEEF_u32; 64];

        unsafe { zero_volatile(range_of(&mut buffer)) };

        assert!(buffer.iter().all(|word| *word == 0));
    }

    /// Only the half-open range is touched.
    #[test]
    fn zero_volatile_stays_in_bounds() {
        let mut buffer = [0xA5A5_A5A5_u32; 16];

        let range = range_of(&mut buffer[4..12]);
        unsafe { zero_volatile(range) };

        assert!(buffer[..4].iter().all(|word| *word == 0xA5A5_A5A5));
        assert!(buffer[4..12].iter().all(|word| *word == 0));
        assert!(buffer[12..].iter().all(|word| *word == 0xA5A5_A5A5));
    }

    #[test]
    fn zero_volatile_empty_range_is_a_no_op() {
        let mut buffer = [7_u8; 4];
        let start = buffer.as_mut_ptr();

        unsafe { zero_volatile(start..start) };

        assert_eq!(buffer, [7; 4]);
    }

    #[test]
    fn copy_volatile_copies_the_image() {
        let image: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut buffer = [0_u32; 10];

        let range = range_of(&mut buffer[1..9]);
        unsafe { copy_volatile(image.as_ptr(), range) };

        assert_eq!(buffer, [0, 1, 2, 3, 4, 5, 6, 7, 8, 0]);
    }

    #[test]
    fn boot_stack_is_stack_aligned() {
        let stack = BootStack::<0x1000>::new();

        assert_eq!(core::mem::align_of::<BootStack<0x1000>>(), 8);
        assert_eq!(core::mem::size_of_val(&stack), 0x1000);
        assert_eq!(&stack as *const _ as usize % 8, 0);
    }
}
