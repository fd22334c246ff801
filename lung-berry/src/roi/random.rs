//! 随机 ROI 拒绝采样.

use ndarray::ArrayView3;
use num::Zero;

use super::{Region, RoiSize, SampleError, SampleResult, Seed, UniformDraw, VoxelDraw};
use crate::consts::DEFAULT_MAX_ROUNDS;

/// 以随机抽取的前景体素为中心生成 ROI.
///
/// 采样按轮进行: 每轮抽取与所需 ROI 个数相同的体素, 丢弃背景体素和无法容纳整个 ROI
/// 的体素, 直到采够为止. 每次 [`RandomRoiSampler::generate`] 开始时都会按
/// [`Seed`] 重新初始化抽取器; 默认的 `Seed::Entropy` 意味着多次调用的结果不可复现.
pub struct RandomRoiSampler<'a, M, D = UniformDraw> {
    mask: ArrayView3<'a, M>,
    draw: D,
    seed: Seed,
    max_rounds: usize,
}

impl<'a, M: Zero + Copy> RandomRoiSampler<'a, M> {
    /// 以掩膜 `mask` 构建, 使用均匀抽取和熵源种子.
    pub fn new(mask: ArrayView3<'a, M>) -> Self {
        Self {
            mask,
            draw: UniformDraw::new(),
            seed: Seed::Entropy,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl<'a, M: Zero + Copy, D: VoxelDraw> RandomRoiSampler<'a, M, D> {
    /// 替换抽取器.
    pub fn with_draw<E: VoxelDraw>(self, draw: E) -> RandomRoiSampler<'a, M, E> {
        RandomRoiSampler {
            mask: self.mask,
            draw,
            seed: self.seed,
            max_rounds: self.max_rounds,
        }
    }

    /// 设置种子来源.
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// 设置最大轮数. 超过该轮数仍未采够时, 采样失败.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// 替换掩膜.
    pub fn set_mask(&mut self, mask: ArrayView3<'a, M>) {
        self.mask = mask;
    }

    /// 采样 `n` 个尺寸为 `size` 的 ROI. 每个 ROI 以非零体素为中心, 且完整落在体数据内.
    ///
    /// `n == 0` 时直接返回空结果. 如果 `max_rounds` 轮之后仍未采够, 则返回
    /// `Err(SampleError::Exhausted)`.
    pub fn generate(&mut self, n: usize, size: RoiSize) -> SampleResult<Vec<Region>> {
        if n == 0 {
            return Ok(vec![]);
        }

        let shape = self.mask.dim();
        self.draw.reinitialize(shape, n, self.seed);

        let mut rois = Vec::with_capacity(n);
        let mut round = Vec::with_capacity(n);
        for r in 0..self.max_rounds {
            round.clear();
            self.draw.draw_round(&mut round);

            for &pos in round.iter() {
                if self.mask[pos].is_zero() {
                    continue;
                }
                if let Some(roi) = Region::centered_at(pos, size, shape) {
                    rois.push(roi);
                    if rois.len() == n {
                        log::debug!("Sampled {n} ROIs in {} rounds", r + 1);
                        return Ok(rois);
                    }
                }
            }
            log::debug!("Round {r}: accepted {}/{n} ROIs", rois.len());
        }

        Err(SampleError::Exhausted {
            accepted: rois.len(),
            requested: n,
            rounds: self.max_rounds,
        })
    }
}
