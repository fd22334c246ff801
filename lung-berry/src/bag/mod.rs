//! Bag 构建.
//!
//! 一个 bag 是一个矩阵: 每行对应一个 ROI, 各列依次为每个 (尺度, 特征) 直方图的
//! 频率. 第 `i` 个尺度第 `k` 个特征的直方图占据列
//! `[(i * NUM_FEATURES + k) * bins, (i * NUM_FEATURES + k + 1) * bins)`.

use std::ops::Range;

use ndarray::{Array2, ArrayView3, ArrayView4, ArrayViewMut1, Axis};
use num::Zero;
use thiserror::Error;

use crate::consts::NUM_FEATURES;
use crate::roi::Region;
use crate::stats::DenseHistogram;
use crate::Idx3d;

/// Bag 构建错误.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BagError {
    /// 直方图个数不等于特征个数乘以尺度个数.
    #[error("expected {expected} histograms (features x scales), got {got}")]
    HistogramCountMismatch {
        /// 期望的直方图个数.
        expected: usize,
        /// 实际的直方图个数.
        got: usize,
    },

    /// 第 `histogram` 个直方图的边界为空或不是升序的.
    #[error("histogram {histogram} has empty or unsorted edges")]
    InvalidEdges {
        /// 直方图序号.
        histogram: usize,
    },

    /// 第 `histogram` 个直方图的 bin 个数与第一个直方图不同.
    #[error("histogram {histogram} has {got} bins, expected {expected}")]
    BinCountMismatch {
        /// 第一个直方图的 bin 个数.
        expected: usize,
        /// 实际 bin 个数.
        got: usize,
        /// 直方图序号.
        histogram: usize,
    },

    /// 尺度序号越界.
    #[error("scale index {scale} out of range ({scales} scales)")]
    ScaleOutOfRange {
        /// 尺度序号.
        scale: usize,
        /// 尺度个数.
        scales: usize,
    },

    /// 特征体数据, 掩膜或 ROI 个数与预期不符.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// 期望的 `(特征个数或 ROI 个数, z, h, w)`.
        expected: (usize, usize, usize, usize),
        /// 实际值.
        got: (usize, usize, usize, usize),
    },

    /// 第 `roi` 个 ROI 超出体数据边界.
    #[error("ROI {roi} is outside the volume")]
    RegionOutOfBounds {
        /// ROI 序号.
        roi: usize,
    },
}

/// Bag 构建结果.
pub type BagResult<T> = Result<T, BagError>;

/// 经过检查的 bag 规格: 尺度列表, 以及按 `scale * NUM_FEATURES + feature` 排列的
/// 直方图边界.
#[derive(Debug, Clone, PartialEq)]
pub struct BagSpec {
    scales: Vec<f64>,
    histograms: Vec<DenseHistogram<f32>>,
    bins: usize,
}

impl BagSpec {
    /// 构建并检查规格. 直方图个数必须等于 `NUM_FEATURES * scales.len()`, 且 bin 个数相同.
    pub fn new(scales: Vec<f64>, edges: Vec<Vec<f32>>) -> BagResult<Self> {
        let expected = NUM_FEATURES * scales.len();
        if edges.len() != expected || expected == 0 {
            return Err(BagError::HistogramCountMismatch {
                expected,
                got: edges.len(),
            });
        }

        let bins = edges[0].len() + 1;
        let histograms = edges
            .into_iter()
            .enumerate()
            .map(|(histogram, e)| {
                let got = e.len() + 1;
                if got != bins {
                    return Err(BagError::BinCountMismatch {
                        expected: bins,
                        got,
                        histogram,
                    });
                }
                DenseHistogram::new(e).ok_or(BagError::InvalidEdges { histogram })
            })
            .collect::<BagResult<Vec<_>>>()?;

        Ok(Self {
            scales,
            histograms,
            bins,
        })
    }

    /// 尺度列表.
    #[inline]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// 每个直方图的 bin 个数.
    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// bag 的总列数.
    #[inline]
    pub fn total_bins(&self) -> usize {
        self.bins * self.histograms.len()
    }

    /// 第 `scale` 个尺度的直方图在列表中的范围.
    fn scale_range(&self, scale: usize) -> Range<usize> {
        scale * NUM_FEATURES..(scale + 1) * NUM_FEATURES
    }
}

/// 按尺度逐步填充 bag 矩阵.
pub struct BagBuilder {
    spec: BagSpec,
    bag: Array2<f32>,
}

impl BagBuilder {
    /// 为 `rows` 个 ROI 构建. 矩阵初始为 0.
    pub fn new(spec: BagSpec, rows: usize) -> Self {
        let cols = spec.total_bins();
        Self {
            spec,
            bag: Array2::zeros((rows, cols)),
        }
    }

    /// 规格.
    #[inline]
    pub fn spec(&self) -> &BagSpec {
        &self.spec
    }

    /// ROI 个数.
    #[inline]
    pub fn rows(&self) -> usize {
        self.bag.nrows()
    }

    /// 用第 `scale` 个尺度的特征填充每个 ROI 对应的列.
    ///
    /// 对第 `j` 个 ROI, 把 ROI 内掩膜非零体素的第 `k` 个特征放入直方图
    /// `scale * NUM_FEATURES + k`, 将频率写入第 `j` 行, 然后清零计数.
    ///
    /// ROI 内没有前景体素时, 该行对应的频率为 NaN.
    pub fn add_scale<M: Zero + Copy + Sync>(
        &mut self,
        scale: usize,
        features: ArrayView4<f32>,
        mask: ArrayView3<M>,
        rois: &[Region],
    ) -> BagResult<()> {
        let scales = self.spec.scales.len();
        if scale >= scales {
            return Err(BagError::ScaleOutOfRange { scale, scales });
        }
        let (k, z, h, w) = features.dim();
        let shape = mask.dim();
        if (k, z, h, w) != (NUM_FEATURES, shape.0, shape.1, shape.2) {
            return Err(BagError::ShapeMismatch {
                expected: (NUM_FEATURES, shape.0, shape.1, shape.2),
                got: (k, z, h, w),
            });
        }
        if rois.len() != self.rows() {
            return Err(BagError::ShapeMismatch {
                expected: (self.rows(), z, h, w),
                got: (rois.len(), z, h, w),
            });
        }
        if let Some(roi) = rois.iter().position(|r| !r.is_inside(shape)) {
            return Err(BagError::RegionOutOfBounds { roi });
        }

        log::info!(
            "Scale {scale} (sigma = {}): filling {} ROIs",
            self.spec.scales[scale],
            rois.len()
        );
        let range = self.spec.scale_range(scale);
        let first_col = range.start * self.spec.bins;
        let filler = RowFiller {
            features: features.view(),
            mask: mask.view(),
            bins: self.spec.bins,
            first_col,
        };

        #[cfg(feature = "rayon")]
        {
            use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
            let local = self.spec.histograms[range].to_vec();
            self.bag
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(rois.into_par_iter())
                .for_each_with(local, |hists, (row, roi)| filler.fill(hists, row, roi));
        }
        #[cfg(not(feature = "rayon"))]
        {
            let hists = &mut self.spec.histograms[range];
            for (row, roi) in self.bag.axis_iter_mut(Axis(0)).zip(rois) {
                filler.fill(hists, row, roi);
            }
        }
        Ok(())
    }

    /// 已填充的 bag.
    #[inline]
    pub fn bag(&self) -> &Array2<f32> {
        &self.bag
    }

    /// 完成构建, 返回 bag.
    pub fn finish(self) -> Array2<f32> {
        self.bag
    }
}

/// 填充一行所需的只读数据.
struct RowFiller<'a, M> {
    features: ArrayView4<'a, f32>,
    mask: ArrayView3<'a, M>,
    bins: usize,
    first_col: usize,
}

impl<M: Zero + Copy> RowFiller<'_, M> {
    fn fill(&self, hists: &mut [DenseHistogram<f32>], mut row: ArrayViewMut1<f32>, roi: &Region) {
        for p in roi.positions() {
            if self.mask[p].is_zero() {
                continue;
            }
            let (z, h, w): Idx3d = p;
            for (k, hist) in hists.iter_mut().enumerate() {
                hist.insert(self.features[(k, z, h, w)]);
            }
        }

        if hists[0].total() == 0 {
            log::warn!("ROI {:?} contains no foreground voxel", roi.index());
        }
        for (k, hist) in hists.iter_mut().enumerate() {
            let start = self.first_col + k * self.bins;
            for (dst, f) in row
                .slice_mut(ndarray::s![start..start + self.bins])
                .iter_mut()
                .zip(hist.frequencies())
            {
                *dst = f;
            }
            hist.reset_counts();
        }
    }
}
