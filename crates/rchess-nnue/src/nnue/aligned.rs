//! 64バイトアラインのヒープ配列
//!
//! パラメータとアキュムレータは SIMD の aligned load/store を前提に
//! キャッシュライン境界に置く。

use super::constants::CACHE_LINE_SIZE;
use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// ゼロ初期化が有効な値になる型
///
/// # Safety
/// 全ビット 0 のパターンがその型の有効な値であり、`Drop` を持たないこと。
pub unsafe trait Zeroable: Copy {}
unsafe impl Zeroable for f32 {}

/// 64バイトアラインで確保した固定長配列
pub struct AlignedBox<T: Zeroable> {
    ptr: NonNull<T>,
    len: usize,
}

// SAFETY: 所有権は一意で、内部参照を持たない
unsafe impl<T: Zeroable + Send> Send for AlignedBox<T> {}
unsafe impl<T: Zeroable + Sync> Sync for AlignedBox<T> {}

impl<T: Zeroable> AlignedBox<T> {
    fn layout(len: usize) -> Layout {
        let size = len.checked_mul(std::mem::size_of::<T>()).expect("AlignedBox size overflow");
        Layout::from_size_align(size, CACHE_LINE_SIZE.max(std::mem::align_of::<T>()))
            .expect("AlignedBox layout")
    }

    /// ゼロ初期化した配列を確保
    pub fn new_zeroed(len: usize) -> Self {
        if len == 0 || std::mem::size_of::<T>() == 0 {
            return Self {
                ptr: NonNull::dangling(),
                len,
            };
        }
        let layout = Self::layout(len);
        // SAFETY: layout のサイズは 0 ではない。T は Zeroable なので全 0 は有効値
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut T;
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        Self { ptr, len }
    }

    /// スライスから複製して確保
    pub fn from_slice(values: &[T]) -> Self {
        let mut boxed = Self::new_zeroed(values.len());
        boxed.copy_from_slice(values);
        boxed
    }
}

impl<T: Zeroable> Deref for AlignedBox<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: ptr は len 要素分確保済み（len == 0 の場合は dangling で長さ 0）
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> DerefMut for AlignedBox<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: 同上。&mut self により排他性が保証される
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Zeroable> Clone for AlignedBox<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self)
    }
}

impl<T: Zeroable> Drop for AlignedBox<T> {
    fn drop(&mut self) {
        if self.len == 0 || std::mem::size_of::<T>() == 0 {
            return;
        }
        // SAFETY: new_zeroed で同じ layout により確保したポインタ
        unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.len)) };
    }
}

impl<T: Zeroable + std::fmt::Debug> std::fmt::Debug for AlignedBox<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_box_alignment() {
        let b: AlignedBox<f32> = AlignedBox::new_zeroed(100);
        assert_eq!(b.as_ptr() as usize % CACHE_LINE_SIZE, 0);
        assert_eq!(b.len(), 100);
        assert!(b.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_aligned_box_zero_len() {
        let b: AlignedBox<f32> = AlignedBox::new_zeroed(0);
        assert!(b.is_empty());
    }

    #[test]
    fn test_aligned_box_clone_is_deep() {
        let mut a: AlignedBox<f32> = AlignedBox::from_slice(&[1.0, 2.0, 3.0]);
        let b = a.clone();
        a[0] = 10.0;
        assert_eq!(&b[..], &[1.0, 2.0, 3.0]);
        assert_eq!(a[0], 10.0);
    }
}
