#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 3D 肺部 CT 的尺度相关纹理特征提取, 以及将采样区域转换为定长特征
//! "bag" 的基础数值/统计算法. 这些 bag 供下游的肺气肿多示例学习分类器使用.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据统一以 `ndarray::Array3` 按 `(z, h, w)` 组织. 标准布局下的行优先顺序
//!   即为体数据的光栅顺序 (x 变化最快).
//! 2. 高斯模糊、导数核 (Hessian, 梯度) 等属于外部协作者, 通过
//!   [`filter::Applicability`] 与 [`filter::VolumePipeline`] 注入, 本 crate 不实现.
//! 3. DICOM / NIfTI 等通用格式读写不在本 crate 范围内. 只实现 HR2 格式的读取.
//!
//! # 开发计划
//!
//! ### 对称 3x3 矩阵闭式特征值求解 ✅
//!
//! 三角函数闭式解, 按绝对值降序返回. 对角矩阵走固定的比较级联.
//!
//! 实现位于 `lung-berry/src/numerics`.
//!
//! ### 归一化卷积 ✅
//!
//! `U = G(c * T) / G(c)`. 零确定度区域不做保护, 由调用者决定是否置零.
//!
//! 参考: Knutsson & Westin, "Normalized and differential convolution", §3.2.
//!
//! 实现位于 `lung-berry/src/filter`.
//!
//! ### 逐体素纹理特征 ✅
//!
//! 3 个 Hessian 特征值, 迹, 行列式, Frobenius 范数, 平滑灰度, 梯度幅值.
//! 可选 `rayon` 按 z 层并行.
//!
//! 实现位于 `lung-berry/src/filter/features.rs`.
//!
//! ### 均衡直方图边界估计 ✅
//!
//! 对实数值样本 (如 Hessian 特征值) 求分位边界, 正确处理重复值.
//!
//! 实现位于 `lung-berry/src/stats/edges.rs`.
//!
//! ### 固定边界稠密直方图 ✅
//!
//! 实现位于 `lung-berry/src/stats/histogram.rs`.
//!
//! ### 训练样本收集 ✅
//!
//! 全部前景体素或随机前景体素, 按 (尺度, 特征) 分组后估计边界.
//!
//! 实现位于 `lung-berry/src/stats/samples.rs`.
//!
//! ### ROI 采样 ✅
//!
//! 稠密 (穷举) 采样和随机拒绝采样. 随机采样支持显式种子, 并有最大轮数限制.
//!
//! 实现位于 `lung-berry/src/roi`.
//!
//! ### HR2 格式读取 ✅
//!
//! 带标签的头部 + zlib 压缩的 `f32` 数据.
//!
//! 实现位于 `lung-berry/src/io/hr2.rs`.
//!
//! ### 文本格式 ✅
//!
//! ROI 列表 (ITK 的 `[x, y, z][sx, sy, sz]`), 直方图边界规格, 逗号分隔的 bag 矩阵.
//!
//! 实现位于 `lung-berry/src/io`.
//!
//! ### Bag 构建 ✅
//!
//! 多尺度、多特征直方图频率拼接为 `rows = ROI` 的矩阵.
//!
//! 实现位于 `lung-berry/src/bag`.

/// 三维索引, 按 `(z, h, w)` 组织. 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod bag;
pub mod consts;
pub mod filter;
pub mod io;
pub mod numerics;
pub mod prelude;
pub mod roi;
pub mod stats;

pub use bag::{BagBuilder, BagSpec};
pub use filter::{normalized_convolution, FeatureExtractor};
pub use io::hr2::{read_hr2, Hr2Header, Hr2Volume};
pub use numerics::eigen::{eigen_features, symmetric_eigenvalues, EigenTriple, SymmetricMatrix3};
pub use roi::{DenseRoiSampler, RandomRoiSampler, Region, RoiSize, Seed};
pub use stats::{determine_edges, DenseHistogram};
