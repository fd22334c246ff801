//! 收集估计均衡直方图边界所用的训练样本.
//!
//! 每个 (尺度, 特征) 对应一个样本总体, 按 `scale * NUM_FEATURES + feature` 排列.
//! 收集完毕后, [`FeatureSamples::into_edges`] 对每个总体排序并估计边界.

use ndarray::{ArrayView3, ArrayView4, Axis, Zip};
use ordered_float::OrderedFloat;

use super::{determine_edges, EdgeResult};
use crate::consts::{DEFAULT_MAX_ROUNDS, NUM_FEATURES};
use crate::roi::{SampleError, SampleResult, Seed, VoxelDraw};

/// 按尺度和特征分组的样本总体.
#[derive(Debug, Clone)]
pub struct FeatureSamples {
    n_scales: usize,
    populations: Vec<Vec<f32>>,
}

impl FeatureSamples {
    /// 为 `n_scales` 个尺度构建空的样本集合.
    pub fn new(n_scales: usize) -> Self {
        Self {
            n_scales,
            populations: vec![vec![]; n_scales * NUM_FEATURES],
        }
    }

    /// 尺度个数.
    #[inline]
    pub fn n_scales(&self) -> usize {
        self.n_scales
    }

    /// 第 `scale` 个尺度, 第 `feature` 个特征的样本.
    pub fn population(&self, scale: usize, feature: usize) -> &[f32] {
        &self.populations[scale * NUM_FEATURES + feature]
    }

    /// 收集 `mask` 中等于 `foreground` 的每一个体素的全部特征. 返回收集到的体素个数.
    ///
    /// `features` 形状为 `(NUM_FEATURES, z, h, w)`.
    ///
    /// # Panics
    ///
    /// `scale` 越界, 或 `features` 与 `mask` 形状不一致时 panic.
    pub fn collect_all<M: PartialEq + Copy>(
        &mut self,
        scale: usize,
        features: ArrayView4<f32>,
        mask: ArrayView3<M>,
        foreground: M,
    ) -> usize {
        self.check(scale, &features, &mask);

        let mut voxels = 0;
        for (k, feature) in features.axis_iter(Axis(0)).enumerate() {
            let pop = &mut self.populations[scale * NUM_FEATURES + k];
            let before = pop.len();
            Zip::from(&feature).and(&mask).for_each(|&v, &m| {
                if m == foreground {
                    pop.push(v);
                }
            });
            voxels = pop.len() - before;
        }
        log::debug!("Scale {scale}: collected {voxels} foreground voxels");
        voxels
    }

    /// 用 `draw` 随机抽取 `n` 个 (可重复的) 前景体素, 并收集它们的全部特征.
    ///
    /// 抽取按轮进行, 每轮 `n` 个体素; 超过默认最大轮数仍未采够时返回
    /// `Err(SampleError::Exhausted)`, 此时已收集的样本保留.
    ///
    /// # Panics
    ///
    /// 同 [`FeatureSamples::collect_all`].
    #[allow(clippy::too_many_arguments)]
    pub fn collect_random<M: PartialEq + Copy, D: VoxelDraw>(
        &mut self,
        scale: usize,
        features: ArrayView4<f32>,
        mask: ArrayView3<M>,
        foreground: M,
        n: usize,
        draw: &mut D,
        seed: Seed,
    ) -> SampleResult<()> {
        self.check(scale, &features, &mask);
        if n == 0 {
            return Ok(());
        }

        draw.reinitialize(mask.dim(), n, seed);
        let mut accepted = 0;
        let mut round = Vec::with_capacity(n);
        for _ in 0..DEFAULT_MAX_ROUNDS {
            round.clear();
            draw.draw_round(&mut round);
            for &(z, h, w) in round.iter() {
                if mask[(z, h, w)] != foreground {
                    continue;
                }
                for k in 0..NUM_FEATURES {
                    self.populations[scale * NUM_FEATURES + k].push(features[(k, z, h, w)]);
                }
                accepted += 1;
                if accepted == n {
                    log::debug!("Scale {scale}: collected {n} random foreground voxels");
                    return Ok(());
                }
            }
        }

        Err(SampleError::Exhausted {
            accepted,
            requested: n,
            rounds: DEFAULT_MAX_ROUNDS,
        })
    }

    /// 对每个样本总体排序, 并估计 `n_bins` 个 bin 的均衡边界.
    ///
    /// 结果按 `scale * NUM_FEATURES + feature` 排列, 可直接作为直方图规格.
    pub fn into_edges(self, n_bins: usize) -> EdgeResult<Vec<Vec<f32>>> {
        self.populations
            .into_iter()
            .map(|mut pop| {
                pop.sort_unstable_by_key(|&v| OrderedFloat(v));
                determine_edges(&pop, n_bins)
            })
            .collect()
    }

    fn check<M>(&self, scale: usize, features: &ArrayView4<f32>, mask: &ArrayView3<M>) {
        assert!(scale < self.n_scales, "scale {scale} out of range");
        let (k, z, h, w) = features.dim();
        assert_eq!(k, NUM_FEATURES);
        assert_eq!((z, h, w), mask.dim());
    }
}
