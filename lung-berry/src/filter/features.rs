//! 逐体素 8 维纹理特征.

use ndarray::{Array3, Array4, ArrayView3, ArrayViewMut3, Axis};
use num::Zero;

use super::{check_shape, normalized_convolution, FilterResult, VolumePipeline};
use crate::consts::{FeatureIndex, NUM_EIGEN_FEATURES, NUM_FEATURES};
use crate::numerics::eigen_features;

/// 单一尺度下的肺部纹理特征提取器.
///
/// 对每个体素输出 8 个特征, 顺序见 [`FeatureIndex`]:
///
/// 1. 以掩膜为确定度, 对图像做尺度 `sigma` 的归一化卷积;
/// 2. 对平滑结果求梯度幅值和 Hessian;
/// 3. 由 Hessian 特征值得到前 6 个特征, 平滑结果与梯度幅值作为最后 2 个特征;
/// 4. 掩膜以外的特征全部为 0.
pub struct FeatureExtractor<P> {
    pipeline: P,
    sigma: f64,
}

impl<P: VolumePipeline> FeatureExtractor<P> {
    /// 以外部算子 `pipeline` 和尺度 `sigma` 构建.
    pub fn new(pipeline: P, sigma: f64) -> Self {
        Self { pipeline, sigma }
    }

    /// 尺度.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// 修改尺度.
    #[inline]
    pub fn set_sigma(&mut self, sigma: f64) {
        self.sigma = sigma;
    }

    /// 外部算子.
    #[inline]
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 提取特征. 输出形状为 `(NUM_FEATURES, z, h, w)`.
    ///
    /// `mask` 中非零体素为前景.
    pub fn extract<M: Zero + Copy + Sync>(
        &self,
        image: ArrayView3<f32>,
        mask: ArrayView3<M>,
    ) -> FilterResult<Array4<f32>> {
        let shape = image.dim();
        check_shape(shape, mask.dim())?;

        let certainty = mask.mapv(|m| if m.is_zero() { 0.0f32 } else { 1.0 });
        let smoothed =
            normalized_convolution(image, certainty.view(), self.sigma, &self.pipeline)?;
        let gradient = self.pipeline.gradient_magnitude(smoothed.view());
        check_shape(shape, gradient.dim())?;
        let hessian = self.pipeline.hessian(smoothed.view());
        for h in hessian.iter() {
            check_shape(shape, h.dim())?;
        }
        log::debug!("Smoothed and differentiated volume {shape:?} at sigma = {}", self.sigma);

        let (z, h, w) = shape;
        let mut out = Array4::zeros((NUM_FEATURES, z, h, w));
        let fields = Fields {
            mask: mask.view(),
            smoothed: &smoothed,
            gradient: &gradient,
            hessian: &hessian,
        };

        #[cfg(feature = "rayon")]
        {
            use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
            out.axis_iter_mut(Axis(1))
                .into_par_iter()
                .enumerate()
                .for_each(|(z, slab)| fields.fill_slab(z, slab));
        }
        #[cfg(not(feature = "rayon"))]
        {
            out.axis_iter_mut(Axis(1))
                .enumerate()
                .for_each(|(z, slab)| fields.fill_slab(z, slab));
        }

        Ok(out)
    }
}

/// 计算特征所需的中间结果.
struct Fields<'a, M> {
    mask: ArrayView3<'a, M>,
    smoothed: &'a Array3<f32>,
    gradient: &'a Array3<f32>,
    hessian: &'a [Array3<f32>; 6],
}

impl<M: Zero + Copy> Fields<'_, M> {
    /// 填充第 `z` 层. `slab` 形状为 `(NUM_FEATURES, h, w)`.
    fn fill_slab(&self, z: usize, mut slab: ArrayViewMut3<f32>) {
        let (_, h, w) = slab.dim();
        for y in 0..h {
            for x in 0..w {
                let p = (z, y, x);
                if self.mask[p].is_zero() {
                    continue;
                }
                let upper: [f32; 6] = std::array::from_fn(|i| self.hessian[i][p]);
                let eig: [f32; NUM_EIGEN_FEATURES] = eigen_features(upper);
                for (k, v) in eig.into_iter().enumerate() {
                    slab[(k, y, x)] = v;
                }
                slab[(FeatureIndex::GaussianBlur as usize, y, x)] = self.smoothed[p];
                slab[(FeatureIndex::GradientMagnitude as usize, y, x)] = self.gradient[p];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Applicability, FilterError};

    /// 不模糊; 梯度幅值为常数 2; Hessian 为对角阵 `diag(v, -1, 0.5)`, `v` 为体素值.
    struct Diagonal;

    impl Applicability for Diagonal {
        fn blur(&self, field: ArrayView3<f32>, _sigma: f64) -> Array3<f32> {
            field.to_owned()
        }
    }

    impl VolumePipeline for Diagonal {
        fn gradient_magnitude(&self, field: ArrayView3<f32>) -> Array3<f32> {
            Array3::from_elem(field.dim(), 2.0)
        }

        fn hessian(&self, field: ArrayView3<f32>) -> [Array3<f32>; 6] {
            let zeros = Array3::zeros(field.dim());
            [
                field.to_owned(),
                zeros.clone(),
                zeros.clone(),
                Array3::from_elem(field.dim(), -1.0),
                zeros,
                Array3::from_elem(field.dim(), 0.5),
            ]
        }
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_feature_layout() {
        let image = Array3::from_shape_fn((2, 2, 2), |(z, h, w)| (1 + z * 4 + h * 2 + w) as f32);
        let mut mask = Array3::<u8>::ones((2, 2, 2));
        mask[(0, 0, 1)] = 0;

        let extractor = FeatureExtractor::new(Diagonal, 1.5);
        assert_eq!(extractor.sigma(), 1.5);
        let f = extractor.extract(image.view(), mask.view()).unwrap();
        assert_eq!(f.dim(), (NUM_FEATURES, 2, 2, 2));

        // 体素 (1, 1, 1) 的值为 8.
        let got: Vec<f32> = (0..NUM_FEATURES).map(|k| f[(k, 1, 1, 1)]).collect();
        let expected = [8.0, -1.0, 0.5, 7.5, -4.0, (64.0f32 + 1.0 + 0.25).sqrt(), 8.0, 2.0];
        assert!(got.iter().zip(expected.iter()).all(|(a, b)| float_eq(*a, *b)));

        // 掩膜以外全部为 0.
        assert!((0..NUM_FEATURES).all(|k| f[(k, 0, 0, 1)] == 0.0));
    }

    #[test]
    fn test_masked_neighbour_does_not_leak() {
        let image = Array3::from_shape_vec((1, 1, 2), vec![3.0, 1000.0]).unwrap();
        let mask = Array3::from_shape_vec((1, 1, 2), vec![1u8, 0]).unwrap();

        // 对全部体素求和: 背景体素的值若参与平滑, 结果会远大于 3.
        fn sum_all(field: ArrayView3<f32>, _: f64) -> Array3<f32> {
            Array3::from_elem(field.dim(), field.sum())
        }
        let certainty = mask.mapv(|m| m as f32);
        let smoothed =
            normalized_convolution(image.view(), certainty.view(), 1.0, &sum_all).unwrap();
        assert!(float_eq(smoothed[(0, 0, 0)], 3.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let image = Array3::<f32>::zeros((2, 2, 2));
        let mask = Array3::<u8>::zeros((2, 2, 3));
        let r = FeatureExtractor::new(Diagonal, 1.0).extract(image.view(), mask.view());
        assert!(matches!(r, Err(FilterError::ShapeMismatch { .. })));
    }
}
