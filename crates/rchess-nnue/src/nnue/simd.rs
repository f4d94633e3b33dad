//! 数値カーネル
//!
//! アキュムレータの行加減算・内積・クランプ。AVX2 が有効なターゲットでは
//! 8 レーン単位で処理し、端数はスカラーで処理する。スカラー版と
//! 要素ごとの演算結果は一致する（`dot` は加算順序のみ異なる）。

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
use avx2 as imp;
#[cfg(not(all(target_arch = "x86_64", target_feature = "avx2")))]
use scalar as imp;

/// `acc[i] += row[i]`
#[inline]
pub fn add_row(acc: &mut [f32], row: &[f32]) {
    debug_assert_eq!(acc.len(), row.len());
    imp::add_row(acc, row);
}

/// `acc[i] -= row[i]`
#[inline]
pub fn sub_row(acc: &mut [f32], row: &[f32]) {
    debug_assert_eq!(acc.len(), row.len());
    imp::sub_row(acc, row);
}

/// 内積
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    imp::dot(a, b)
}

/// `output[i] = clamp(input[i], lower, upper)`
#[inline]
pub fn clamp_into(input: &[f32], output: &mut [f32], lower: f32, upper: f32) {
    debug_assert_eq!(input.len(), output.len());
    debug_assert!(lower <= upper);
    imp::clamp_into(input, output, lower, upper);
}

/// スカラー実装（フォールバック兼テスト用リファレンス）
pub mod scalar {
    #[inline]
    pub fn add_row(acc: &mut [f32], row: &[f32]) {
        for (a, &w) in acc.iter_mut().zip(row) {
            *a += w;
        }
    }

    #[inline]
    pub fn sub_row(acc: &mut [f32], row: &[f32]) {
        for (a, &w) in acc.iter_mut().zip(row) {
            *a -= w;
        }
    }

    #[inline]
    pub fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(&x, &y)| x * y).sum()
    }

    #[inline]
    pub fn clamp_into(input: &[f32], output: &mut [f32], lower: f32, upper: f32) {
        for (o, &x) in output.iter_mut().zip(input) {
            *o = x.max(lower).min(upper);
        }
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
mod avx2 {
    //! ループ内のポインタ演算は `n` 要素以内に収まる。

    use std::arch::x86_64::*;

    const LANES: usize = 8;

    #[inline]
    pub fn add_row(acc: &mut [f32], row: &[f32]) {
        let n = acc.len().min(row.len());
        let chunks = n / LANES;
        let acc_ptr = acc.as_mut_ptr();
        let row_ptr = row.as_ptr();
        unsafe {
            for i in 0..chunks {
                let a = _mm256_loadu_ps(acc_ptr.add(i * LANES));
                let w = _mm256_loadu_ps(row_ptr.add(i * LANES));
                _mm256_storeu_ps(acc_ptr.add(i * LANES), _mm256_add_ps(a, w));
            }
        }
        super::scalar::add_row(&mut acc[chunks * LANES..n], &row[chunks * LANES..n]);
    }

    #[inline]
    pub fn sub_row(acc: &mut [f32], row: &[f32]) {
        let n = acc.len().min(row.len());
        let chunks = n / LANES;
        let acc_ptr = acc.as_mut_ptr();
        let row_ptr = row.as_ptr();
        unsafe {
            for i in 0..chunks {
                let a = _mm256_loadu_ps(acc_ptr.add(i * LANES));
                let w = _mm256_loadu_ps(row_ptr.add(i * LANES));
                _mm256_storeu_ps(acc_ptr.add(i * LANES), _mm256_sub_ps(a, w));
            }
        }
        super::scalar::sub_row(&mut acc[chunks * LANES..n], &row[chunks * LANES..n]);
    }

    #[inline]
    pub fn dot(a: &[f32], b: &[f32]) -> f32 {
        let n = a.len().min(b.len());
        let chunks = n / LANES;
        let mut lanes = [0.0f32; LANES];
        unsafe {
            let mut sum = _mm256_setzero_ps();
            for i in 0..chunks {
                let x = _mm256_loadu_ps(a.as_ptr().add(i * LANES));
                let y = _mm256_loadu_ps(b.as_ptr().add(i * LANES));
                sum = _mm256_add_ps(sum, _mm256_mul_ps(x, y));
            }
            _mm256_storeu_ps(lanes.as_mut_ptr(), sum);
        }
        lanes.iter().sum::<f32>()
            + super::scalar::dot(&a[chunks * LANES..n], &b[chunks * LANES..n])
    }

    #[inline]
    pub fn clamp_into(input: &[f32], output: &mut [f32], lower: f32, upper: f32) {
        let n = input.len().min(output.len());
        let chunks = n / LANES;
        unsafe {
            let lo = _mm256_set1_ps(lower);
            let hi = _mm256_set1_ps(upper);
            for i in 0..chunks {
                let x = _mm256_loadu_ps(input.as_ptr().add(i * LANES));
                let y = _mm256_min_ps(_mm256_max_ps(x, lo), hi);
                _mm256_storeu_ps(output.as_mut_ptr().add(i * LANES), y);
            }
        }
        super::scalar::clamp_into(
            &input[chunks * LANES..n],
            &mut output[chunks * LANES..n],
            lower,
            upper,
        );
    }
}
