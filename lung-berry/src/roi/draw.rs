//! 随机体素抽取.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Idx3d;

/// 随机数种子来源.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Seed {
    /// 每次重新初始化时都从操作系统熵源取种子. 多次采样的结果互不相同.
    #[default]
    Entropy,

    /// 固定种子. 每次重新初始化后产生完全相同的序列.
    Fixed(u64),
}

impl Seed {
    /// 按种子来源构建随机数生成器.
    pub fn rng(self) -> StdRng {
        match self {
            Seed::Entropy => StdRng::from_entropy(),
            Seed::Fixed(s) => StdRng::seed_from_u64(s),
        }
    }
}

/// 按轮次进行的随机体素抽取.
///
/// 每一轮最多产生固定个数的体素索引; 要获得更多样本, 需要继续抽取下一轮.
pub trait VoxelDraw {
    /// 重新初始化: 之后每轮从形状为 `shape` 的体数据中抽取 `per_round` 个体素,
    /// 随机数种子来自 `seed`.
    fn reinitialize(&mut self, shape: Idx3d, per_round: usize, seed: Seed);

    /// 抽取一轮, 结果追加到 `out`.
    fn draw_round(&mut self, out: &mut Vec<Idx3d>);
}

/// 有放回的均匀体素抽取.
#[derive(Debug, Clone)]
pub struct UniformDraw {
    rng: StdRng,
    shape: Idx3d,
    per_round: usize,
}

impl UniformDraw {
    /// 构建一个尚未初始化 (每轮抽取 0 个体素) 的抽取器.
    pub fn new() -> Self {
        Self {
            rng: Seed::Entropy.rng(),
            shape: (0, 0, 0),
            per_round: 0,
        }
    }
}

impl Default for UniformDraw {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelDraw for UniformDraw {
    fn reinitialize(&mut self, shape: Idx3d, per_round: usize, seed: Seed) {
        self.rng = seed.rng();
        self.shape = shape;
        self.per_round = per_round;
    }

    fn draw_round(&mut self, out: &mut Vec<Idx3d>) {
        let (z, h, w) = self.shape;
        let total = z * h * w;
        if total == 0 {
            return;
        }
        out.reserve(self.per_round);
        for _ in 0..self.per_round {
            let offset = self.rng.gen_range(0..total);
            out.push((offset / (h * w), offset / w % h, offset % w));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rounds(seed: Seed, n: usize) -> Vec<Idx3d> {
        let mut draw = UniformDraw::new();
        draw.reinitialize((3, 4, 5), 16, seed);
        let mut out = vec![];
        for _ in 0..n {
            draw.draw_round(&mut out);
        }
        out
    }

    #[test]
    fn test_round_size_and_bounds() {
        let out = rounds(Seed::Fixed(3), 4);
        assert_eq!(out.len(), 64);
        assert!(out.iter().all(|&(z, h, w)| z < 3 && h < 4 && w < 5));
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        assert_eq!(rounds(Seed::Fixed(11), 3), rounds(Seed::Fixed(11), 3));
        assert_ne!(rounds(Seed::Fixed(11), 3), rounds(Seed::Fixed(12), 3));
    }

    #[test]
    fn test_empty_shape_draws_nothing() {
        let mut draw = UniformDraw::new();
        draw.reinitialize((0, 4, 5), 16, Seed::Fixed(0));
        let mut out = vec![];
        draw.draw_round(&mut out);
        assert!(out.is_empty());
    }
}
