//! 统计: 均衡直方图边界估计, 固定边界稠密直方图, 以及估计边界所用的训练样本收集.

use thiserror::Error;

mod edges;
mod histogram;
pub mod samples;

pub use edges::{determine_edges, determine_edges_in};
pub use histogram::DenseHistogram;
pub use samples::FeatureSamples;

/// 边界估计错误.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum EdgeError {
    /// 样本区间的起点在终点之后.
    #[error("inverted sample range: {start} > {end}")]
    InvertedRange {
        /// 区间起点.
        start: usize,
        /// 区间终点.
        end: usize,
    },

    /// bin 的个数多于样本个数.
    #[error("too many bins: {bins} bins for {samples} samples")]
    TooManyBins {
        /// 要求的 bin 个数.
        bins: usize,
        /// 实际样本个数.
        samples: usize,
    },

    /// bin 的个数为 0.
    #[error("number of bins must be positive")]
    ZeroBins,
}

/// 边界估计结果.
pub type EdgeResult<T> = Result<T, EdgeError>;
