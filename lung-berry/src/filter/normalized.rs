//! 归一化卷积 (0 阶, 即插值形式).
//!
//! 参考: Knutsson & Westin, "Normalized and differential convolution", §3.2.

use ndarray::{Array3, ArrayView3, ArrayViewMut3, Zip};
use num::Zero;

use super::{check_shape, Applicability, FilterResult};

/// 计算 `U = G(c * T) / G(c)`, 其中 `T = values`, `c = certainty`, `G` 为尺度
/// `sigma` 的适用函数.
///
/// # 注意
///
/// 除法不做保护. `G(c)` 为 0 的位置结果是 `NaN` 或无穷, 如需置零请调用
/// [`mask_uncertain`].
pub fn normalized_convolution<A: Applicability + ?Sized>(
    values: ArrayView3<f32>,
    certainty: ArrayView3<f32>,
    sigma: f64,
    applicability: &A,
) -> FilterResult<Array3<f32>> {
    let shape = values.dim();
    check_shape(shape, certainty.dim())?;

    let weighted = &values * &certainty;
    let mut numerator = applicability.blur(weighted.view(), sigma);
    check_shape(shape, numerator.dim())?;
    let denominator = applicability.blur(certainty, sigma);
    check_shape(shape, denominator.dim())?;

    Zip::from(&mut numerator)
        .and(&denominator)
        .for_each(|n, &d| *n /= d);
    Ok(numerator)
}

/// 将 `field` 中 `mask` 为 0 的位置置为 0. 返回被置零的体素个数.
pub fn mask_uncertain<M: Zero + Copy>(
    mut field: ArrayViewMut3<f32>,
    mask: ArrayView3<M>,
) -> FilterResult<usize> {
    check_shape(field.dim(), mask.dim())?;
    let mut cnt = 0;
    Zip::from(&mut field).and(&mask).for_each(|v, m| {
        if m.is_zero() {
            *v = 0.0;
            cnt += 1;
        }
    });
    Ok(cnt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterError;
    use ndarray::{s, Array3};

    /// 沿 w 轴的 3 点均值模糊, 边界处只对有效邻居求平均. 不使用 `sigma`.
    fn box_w(field: ArrayView3<f32>, _sigma: f64) -> Array3<f32> {
        let (_, _, w) = field.dim();
        Array3::from_shape_fn(field.dim(), |(z, h, x)| {
            let lo = x.saturating_sub(1);
            let hi = (x + 2).min(w);
            let lane = field.slice(s![z, h, lo..hi]);
            lane.sum() / lane.len() as f32
        })
    }

    fn identity(field: ArrayView3<f32>, _sigma: f64) -> Array3<f32> {
        field.to_owned()
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_full_certainty_equals_blur() {
        let values = Array3::from_shape_fn((2, 2, 5), |(z, h, w)| (z * 10 + h * 5 + w) as f32);
        let certainty = Array3::ones((2, 2, 5));
        let u = normalized_convolution(values.view(), certainty.view(), 1.0, &box_w).unwrap();
        let blurred = box_w(values.view(), 1.0);
        assert!(u.iter().zip(blurred.iter()).all(|(a, b)| float_eq(*a, *b)));
    }

    #[test]
    fn test_uncertain_samples_are_ignored() {
        // 中间体素的取值不可信, 结果应由两侧插值得到.
        let values = Array3::from_shape_vec((1, 1, 3), vec![1.0, 100.0, 3.0]).unwrap();
        let certainty = Array3::from_shape_vec((1, 1, 3), vec![1.0, 0.0, 1.0]).unwrap();
        let u = normalized_convolution(values.view(), certainty.view(), 1.0, &box_w).unwrap();
        assert!(float_eq(u[(0, 0, 0)], 1.0));
        assert!(float_eq(u[(0, 0, 1)], 2.0));
        assert!(float_eq(u[(0, 0, 2)], 3.0));
    }

    #[test]
    fn test_zero_certainty_is_not_guarded() {
        let values = Array3::from_elem((1, 1, 2), 4.0f32);
        let certainty = Array3::from_shape_vec((1, 1, 2), vec![1.0, 0.0]).unwrap();
        let mut u =
            normalized_convolution(values.view(), certainty.view(), 1.0, &identity).unwrap();
        assert!(float_eq(u[(0, 0, 0)], 4.0));
        assert!(u[(0, 0, 1)].is_nan());

        assert_eq!(mask_uncertain(u.view_mut(), certainty.view()), Ok(1));
        assert_eq!(u[(0, 0, 1)], 0.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let values = Array3::<f32>::zeros((1, 2, 3));
        let certainty = Array3::<f32>::zeros((1, 3, 2));
        assert_eq!(
            normalized_convolution(values.view(), certainty.view(), 1.0, &identity),
            Err(FilterError::ShapeMismatch {
                expected: (1, 2, 3),
                got: (1, 3, 2)
            })
        );
    }
}
