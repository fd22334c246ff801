//! 通用常量.

/// 每个尺度下每个体素的特征个数.
pub const NUM_FEATURES: usize = 8;

/// 由特征值求得的特征个数 (3 个特征值, 迹, 行列式, Frobenius 范数).
pub const NUM_EIGEN_FEATURES: usize = 6;

/// 特征名称, 顺序与 [`FeatureIndex`] 一致.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Eigenvalue1",
    "Eigenvalue2",
    "Eigenvalue3",
    "LaplacianOfGaussian",
    "GaussianCurvature",
    "FrobeniusNorm",
    "GaussianBlur",
    "GradientMagnitude",
];

/// 特征向量中各分量的位置.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum FeatureIndex {
    /// 绝对值最大的特征值.
    Eigen0 = 0,

    /// 绝对值居中的特征值.
    Eigen1 = 1,

    /// 绝对值最小的特征值.
    Eigen2 = 2,

    /// 迹, 即三个特征值之和.
    Trace = 3,

    /// 行列式, 即三个特征值之积.
    Determinant = 4,

    /// Frobenius 范数.
    FrobeniusNorm = 5,

    /// 高斯 (归一化卷积) 模糊后的灰度.
    GaussianBlur = 6,

    /// 模糊后图像的梯度模.
    GradientMagnitude = 7,
}

impl FeatureIndex {
    /// 按特征向量顺序排列的全部分量.
    pub const ALL: [FeatureIndex; NUM_FEATURES] = [
        Self::Eigen0,
        Self::Eigen1,
        Self::Eigen2,
        Self::Trace,
        Self::Determinant,
        Self::FrobeniusNorm,
        Self::GaussianBlur,
        Self::GradientMagnitude,
    ];

    /// 分量名称.
    #[inline]
    pub const fn name(self) -> &'static str {
        FEATURE_NAMES[self as usize]
    }
}

/// ROI 默认边长 (体素), 三个方向相同.
pub const DEFAULT_ROI_EXTENT: usize = 41;

/// 随机 ROI 采样的默认最大轮数.
pub const DEFAULT_MAX_ROUNDS: usize = 10_000;

/// zlib 解压时每次读入/输出的块大小 (字节).
pub const INFLATE_CHUNK: usize = 16 * 1024;
