//! 感兴趣区域 (ROI) 及其采样.
//!
//! ROI 是与坐标轴对齐的长方体, 由起点索引和各轴尺寸确定. 采样器以掩膜中的前景体素
//! 为中心生成 ROI, 并丢弃超出体数据边界的 ROI.

use ndarray::{s, ArrayView3};
use thiserror::Error;

use crate::consts::DEFAULT_ROI_EXTENT;
use crate::Idx3d;

mod dense;
mod draw;
mod random;

pub use dense::DenseRoiSampler;
pub use draw::{Seed, UniformDraw, VoxelDraw};
pub use random::RandomRoiSampler;

/// 随机采样错误.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SampleError {
    /// 达到最大轮数仍未采够 ROI. 通常意味着掩膜中没有能容纳整个 ROI 的前景体素.
    #[error("accepted {accepted} of {requested} ROIs after {rounds} rounds")]
    Exhausted {
        /// 已接受的 ROI 个数.
        accepted: usize,
        /// 要求的 ROI 个数.
        requested: usize,
        /// 已进行的轮数.
        rounds: usize,
    },
}

/// 随机采样结果.
pub type SampleResult<T> = Result<T, SampleError>;

/// ROI 各轴尺寸 (体素), 按 `(z, h, w)` 组织, 每个分量至少为 1.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoiSize(Idx3d);

impl RoiSize {
    /// 构建 ROI 尺寸. 存在为 0 的分量时返回 `None`.
    pub fn new(z: usize, h: usize, w: usize) -> Option<Self> {
        if z > 0 && h > 0 && w > 0 {
            Some(Self((z, h, w)))
        } else {
            None
        }
    }

    /// 边长为 `n` 的立方体.
    #[inline]
    pub fn cube(n: usize) -> Option<Self> {
        Self::new(n, n, n)
    }

    /// 肺部纹理分析常用的 41x41x41 立方体.
    #[inline]
    pub const fn default_lung() -> Self {
        Self((DEFAULT_ROI_EXTENT, DEFAULT_ROI_EXTENT, DEFAULT_ROI_EXTENT))
    }

    /// 各轴尺寸.
    #[inline]
    pub const fn get(&self) -> Idx3d {
        self.0
    }

    /// 各轴尺寸的一半 (整数除法).
    #[inline]
    pub const fn half(&self) -> Idx3d {
        let (z, h, w) = self.0;
        (z / 2, h / 2, w / 2)
    }

    /// 体素个数.
    #[inline]
    pub const fn voxels(&self) -> usize {
        let (z, h, w) = self.0;
        z * h * w
    }
}

impl Default for RoiSize {
    #[inline]
    fn default() -> Self {
        Self::default_lung()
    }
}

/// 与坐标轴对齐的长方体区域. 起点索引与尺寸均按 `(z, h, w)` 组织.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    index: Idx3d,
    size: Idx3d,
}

impl Region {
    /// 由起点 `index` 和尺寸 `size` 构建.
    #[inline]
    pub const fn new(index: Idx3d, size: Idx3d) -> Self {
        Self { index, size }
    }

    /// 以 `center` 为中心、尺寸为 `size` 的区域, 起点为 `center - size / 2`.
    ///
    /// 若区域不能完整地落在形状为 `shape` 的体数据内, 则返回 `None`.
    pub fn centered_at(center: Idx3d, size: RoiSize, shape: Idx3d) -> Option<Self> {
        let (hz, hh, hw) = size.half();
        let index = (
            center.0.checked_sub(hz)?,
            center.1.checked_sub(hh)?,
            center.2.checked_sub(hw)?,
        );
        let roi = Self::new(index, size.get());
        roi.is_inside(shape).then_some(roi)
    }

    /// 起点索引.
    #[inline]
    pub const fn index(&self) -> Idx3d {
        self.index
    }

    /// 各轴尺寸.
    #[inline]
    pub const fn size(&self) -> Idx3d {
        self.size
    }

    /// 体素个数. 溢出时饱和为 `usize::MAX`.
    #[inline]
    pub const fn voxels(&self) -> usize {
        let (z, h, w) = self.size;
        z.saturating_mul(h).saturating_mul(w)
    }

    /// 各轴的终点 (不含), 即 `index + size`. 任一轴溢出时返回 `None`.
    pub fn end(&self) -> Option<Idx3d> {
        let (z0, h0, w0) = self.index;
        let (sz, sh, sw) = self.size;
        Some((z0.checked_add(sz)?, h0.checked_add(sh)?, w0.checked_add(sw)?))
    }

    /// 区域是否非空且完整地落在形状为 `shape` 的体数据内. 终点溢出的区域不在任何体数据内.
    pub fn is_inside(&self, (z, h, w): Idx3d) -> bool {
        let (sz, sh, sw) = self.size;
        match self.end() {
            Some((z1, h1, w1)) => sz > 0 && sh > 0 && sw > 0 && z1 <= z && h1 <= h && w1 <= w,
            None => false,
        }
    }

    /// 区域是否包含 `pos`.
    pub fn contains(&self, (z, h, w): Idx3d) -> bool {
        let (z0, h0, w0) = self.index;
        let (sz, sh, sw) = self.size;
        z >= z0 && z - z0 < sz && h >= h0 && h - h0 < sh && w >= w0 && w - w0 < sw
    }

    /// 获取 `data` 在该区域内的视图.
    ///
    /// 区域越界时 panic.
    pub fn view<'a, A>(&self, data: &ArrayView3<'a, A>) -> ArrayView3<'a, A> {
        assert!(self.is_inside(data.dim()), "region {self:?} is outside {:?}", data.dim());
        let (z0, h0, w0) = self.index;
        let (sz, sh, sw) = self.size;
        data.clone()
            .slice_move(s![z0..z0 + sz, h0..h0 + sh, w0..w0 + sw])
    }

    /// 按光栅顺序迭代区域内所有体素的 (全局) 索引. 溢出的轴截断到 `usize::MAX`.
    pub fn positions(&self) -> impl Iterator<Item = Idx3d> {
        let (z0, h0, w0) = self.index;
        let (sz, sh, sw) = self.size;
        let (z1, h1, w1) = (z0.saturating_add(sz), h0.saturating_add(sh), w0.saturating_add(sw));
        (z0..z1).flat_map(move |z| (h0..h1).flat_map(move |h| (w0..w1).map(move |w| (z, h, w))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_roi_size() {
        assert!(RoiSize::new(0, 1, 1).is_none());
        assert_eq!(RoiSize::cube(3).unwrap().half(), (1, 1, 1));
        assert_eq!(RoiSize::new(4, 2, 1).unwrap().half(), (2, 1, 0));
        assert_eq!(RoiSize::default().get(), (41, 41, 41));
    }

    #[test]
    fn test_centered_at() {
        let size = RoiSize::cube(3).unwrap();
        let shape = (5, 5, 5);
        assert_eq!(
            Region::centered_at((2, 2, 2), size, shape),
            Some(Region::new((1, 1, 1), (3, 3, 3)))
        );
        assert_eq!(
            Region::centered_at((1, 1, 1), size, shape),
            Some(Region::new((0, 0, 0), (3, 3, 3)))
        );
        assert!(Region::centered_at((0, 2, 2), size, shape).is_none());
        assert!(Region::centered_at((2, 2, 4), size, shape).is_none());

        // 偶数尺寸: 中心偏向区域的后半部分.
        let even = RoiSize::new(2, 2, 2).unwrap();
        assert_eq!(
            Region::centered_at((4, 4, 4), even, shape),
            Some(Region::new((3, 3, 3), (2, 2, 2)))
        );
    }

    #[test]
    fn test_positions_and_view() {
        let data = Array3::from_shape_fn((4, 4, 4), |(z, h, w)| (z * 16 + h * 4 + w) as u32);
        let roi = Region::new((1, 2, 0), (2, 1, 3));
        let pos: Vec<_> = roi.positions().collect();
        assert_eq!(pos.len(), roi.voxels());
        assert_eq!(pos[0], (1, 2, 0));
        assert_eq!(pos[5], (2, 2, 2));

        let view = roi.view(&data.view());
        assert_eq!(view.dim(), (2, 1, 3));
        let flat: Vec<u32> = view.iter().copied().collect();
        let expected: Vec<u32> = pos.iter().map(|p| data[*p]).collect();
        assert_eq!(flat, expected);
        assert!(pos.iter().all(|p| roi.contains(*p)));
        assert!(!roi.contains((0, 0, 0)));
    }

    #[test]
    fn test_overflowing_region() {
        let roi = Region::new((1, 1, 1), (usize::MAX, 1, 1));
        assert_eq!(roi.end(), None);
        assert!(!roi.is_inside((4, 4, 4)));
        assert!(!roi.is_inside((usize::MAX, usize::MAX, usize::MAX)));
        assert!(roi.contains((usize::MAX - 1, 1, 1)));
        assert!(!roi.contains((0, 1, 1)));
        assert_eq!(roi.voxels(), usize::MAX);
        assert_eq!(roi.positions().nth(2), Some((3, 1, 1)));

        let roi = Region::new((2, 2, 2), (1, 0, 1));
        assert!(!roi.is_inside((4, 4, 4)));
    }
}
