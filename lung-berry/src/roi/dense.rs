//! 稠密 ROI 采样.

use ndarray::ArrayView3;
use num::Zero;

use super::{Region, RoiSize};

/// 以掩膜中每一个前景体素为中心生成 ROI.
pub struct DenseRoiSampler<'a, M> {
    mask: ArrayView3<'a, M>,
}

impl<'a, M: Zero + Copy> DenseRoiSampler<'a, M> {
    /// 以掩膜 `mask` 构建. 非零体素为前景.
    pub fn new(mask: ArrayView3<'a, M>) -> Self {
        Self { mask }
    }

    /// 替换掩膜.
    pub fn set_mask(&mut self, mask: ArrayView3<'a, M>) {
        self.mask = mask;
    }

    /// 按光栅顺序遍历掩膜, 为每个前景体素生成尺寸为 `size` 的居中 ROI,
    /// 并只保留完整落在体数据内的 ROI.
    ///
    /// 结果确定, 顺序即光栅顺序.
    pub fn generate(&self, size: RoiSize) -> Vec<Region> {
        let shape = self.mask.dim();
        let rois: Vec<Region> = self
            .mask
            .indexed_iter()
            .filter(|(_, m)| !m.is_zero())
            .filter_map(|(pos, _)| Region::centered_at(pos, size, shape))
            .collect();
        log::debug!("Dense sampling kept {} ROIs of size {:?}", rois.len(), size.get());
        rois
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_single_center() {
        let mut mask = Array3::<u8>::zeros((5, 5, 5));
        mask[(2, 2, 2)] = 1;
        mask[(0, 0, 0)] = 1; // 无法容纳 3x3x3
        let rois = DenseRoiSampler::new(mask.view()).generate(RoiSize::cube(3).unwrap());
        assert_eq!(rois, vec![Region::new((1, 1, 1), (3, 3, 3))]);
    }

    #[test]
    fn test_raster_order() {
        let mask = Array3::<u16>::ones((3, 4, 5));
        let rois = DenseRoiSampler::new(mask.view()).generate(RoiSize::new(1, 3, 3).unwrap());
        // z: 3 个中心, h: 2 个, w: 3 个.
        assert_eq!(rois.len(), 3 * 2 * 3);
        assert_eq!(rois[0].index(), (0, 0, 0));
        assert_eq!(rois[1].index(), (0, 0, 1));
        assert_eq!(rois[3].index(), (0, 1, 0));
        assert_eq!(rois[6].index(), (1, 0, 0));
    }

    #[test]
    fn test_count_matches_fitting_foreground() {
        let mut rng = StdRng::seed_from_u64(5);
        let mask = Array3::from_shape_fn((8, 9, 10), |_| rng.gen_bool(0.3) as u8);
        let size = RoiSize::new(3, 5, 4).unwrap();
        let shape = mask.dim();

        let expected = mask
            .indexed_iter()
            .filter(|(p, m)| **m != 0 && Region::centered_at(*p, size, shape).is_some())
            .count();
        let rois = DenseRoiSampler::new(mask.view()).generate(size);
        assert_eq!(rois.len(), expected);
        assert!(rois.iter().all(|r| r.is_inside(shape)));
    }

    #[test]
    fn test_set_mask() {
        let empty = Array3::<f32>::zeros((4, 4, 4));
        let full = Array3::<f32>::ones((4, 4, 4));
        let mut sampler = DenseRoiSampler::new(empty.view());
        assert!(sampler.generate(RoiSize::cube(1).unwrap()).is_empty());
        sampler.set_mask(full.view());
        assert_eq!(sampler.generate(RoiSize::cube(1).unwrap()).len(), 64);
    }
}
