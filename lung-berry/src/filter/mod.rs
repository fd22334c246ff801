//! 滤波: 归一化卷积, 以及逐体素的 8 维纹理特征提取.
//!
//! 高斯模糊、梯度幅值、Hessian 等核本身属于外部协作者, 以 [`Applicability`] 和
//! [`VolumePipeline`] 的形式注入. 所有输入都是已经实体化的数组.

use ndarray::{Array3, ArrayView3};
use thiserror::Error;

use crate::Idx3d;

mod features;
mod normalized;

pub use features::FeatureExtractor;
pub use normalized::{mask_uncertain, normalized_convolution};

/// 滤波错误.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum FilterError {
    /// 两个体数据的形状不一致.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// 期望的形状.
        expected: Idx3d,
        /// 实际的形状.
        got: Idx3d,
    },
}

/// 滤波结果.
pub type FilterResult<T> = Result<T, FilterError>;

/// 检查 `got` 是否等于 `expected`.
pub(crate) fn check_shape(expected: Idx3d, got: Idx3d) -> FilterResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(FilterError::ShapeMismatch { expected, got })
    }
}

/// 归一化卷积的适用函数 (applicability), 通常是尺度为 `sigma` 的高斯模糊.
///
/// 实现必须返回与输入形状相同的体数据.
pub trait Applicability {
    /// 以尺度 `sigma` 模糊 `field`.
    fn blur(&self, field: ArrayView3<f32>, sigma: f64) -> Array3<f32>;
}

impl<F> Applicability for F
where
    F: Fn(ArrayView3<f32>, f64) -> Array3<f32>,
{
    #[inline]
    fn blur(&self, field: ArrayView3<f32>, sigma: f64) -> Array3<f32> {
        self(field, sigma)
    }
}

/// 特征提取所需的全部外部算子.
///
/// 各方法必须返回与输入形状相同的体数据.
pub trait VolumePipeline: Applicability {
    /// 梯度幅值.
    fn gradient_magnitude(&self, field: ArrayView3<f32>) -> Array3<f32>;

    /// Hessian 矩阵的 6 个独立分量, 按 `(zz, zh, zw, hh, hw, ww)` 排列,
    /// 即对称矩阵上三角的行优先顺序.
    fn hessian(&self, field: ArrayView3<f32>) -> [Array3<f32>; 6];
}
