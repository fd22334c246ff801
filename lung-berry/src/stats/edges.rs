//! 均衡直方图的边界估计.
//!
//! 常规的直方图均衡假设图像取值是离散的, 但这里的样本是实数 (如 Hessian 特征值),
//! 且可能存在大量重复值. 因此边界不能简单地按等间隔下标选取, 而要在重复值区段的
//! 两端之间做取舍, 并把由此产生的多余/不足样本数分摊到后续的 bin 上.

use std::ops::Range;

use super::{EdgeError, EdgeResult};

/// 尚未分摊的样本偏差. 两者至多一个非零.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct Balance {
    /// 后续 bin 需要多容纳的样本数.
    surplus: usize,

    /// 后续 bin 需要少容纳的样本数.
    deficit: usize,
}

impl Balance {
    /// 计算本条边界需要分摊的偏差, 并据此修正步长.
    ///
    /// 偏差平均分摊到剩余的 `remaining` 条边界上, 不够分时至少分 1, 即偏向靠前的 bin.
    fn settle(&mut self, step: usize, remaining: usize) -> usize {
        if self.surplus > 0 {
            let share = (self.surplus / remaining).max(1);
            self.surplus -= share;
            step + share
        } else if self.deficit > 0 {
            let share = (self.deficit / remaining).max(1);
            self.deficit -= share;
            step.saturating_sub(share)
        } else {
            step
        }
    }

    /// 边界后退 `dist` 个样本, 当前 bin 变小.
    fn snap_back(&mut self, dist: usize) {
        if dist > self.deficit {
            self.surplus = dist - self.deficit;
            self.deficit = 0;
        } else {
            self.deficit -= dist;
        }
    }

    /// 边界前进 `dist` 个样本, 当前 bin 变大.
    fn snap_forward(&mut self, dist: usize) {
        if dist > self.surplus {
            self.deficit = dist - self.surplus;
            self.surplus = 0;
        } else {
            self.surplus -= dist;
        }
    }
}

/// 为升序样本 `sorted` 计算 `n_bins - 1` 条边界, 使各 bin 的样本数尽量相等.
///
/// 当样本两两不同且 `n_bins` 整除样本数时, 以左闭 (`[e_i, e_{i+1})`) 方式计数,
/// 各 bin 的样本数恰好相等. 存在重复值时只能近似相等.
///
/// # 注意
///
/// 1. `sorted` 必须升序, 否则结果无意义 (debug 模式下会 panic).
/// 2. `n_bins` 为 0 时返回 `Err(EdgeError::ZeroBins)`.
/// 3. `n_bins` 大于样本数时返回 `Err(EdgeError::TooManyBins)`.
/// 4. 当重复值极多, 以至于剩余样本不足以产生新的边界时, 边界可能重复.
pub fn determine_edges<T: PartialOrd + Copy>(sorted: &[T], n_bins: usize) -> EdgeResult<Vec<T>> {
    determine_edges_in(sorted, 0..sorted.len(), n_bins)
}

/// 与 [`determine_edges`] 相同, 但只使用 `samples[range]` 中的样本.
///
/// `range.start > range.end` 时返回 `Err(EdgeError::InvertedRange)`.
/// `range.end` 越界时 panic.
pub fn determine_edges_in<T: PartialOrd + Copy>(
    samples: &[T],
    range: Range<usize>,
    n_bins: usize,
) -> EdgeResult<Vec<T>> {
    if range.start > range.end {
        return Err(EdgeError::InvertedRange {
            start: range.start,
            end: range.end,
        });
    }
    let s = &samples[range];
    let n = s.len();

    if n_bins == 0 {
        return Err(EdgeError::ZeroBins);
    }
    if n < n_bins {
        return Err(EdgeError::TooManyBins {
            bins: n_bins,
            samples: n,
        });
    }
    debug_assert!(s.windows(2).all(|w| w[0] <= w[1]), "样本必须升序");

    let per_bin = n / n_bins;
    let mut balance = Balance {
        surplus: n - per_bin * n_bins,
        deficit: 0,
    };
    let mut edges = Vec::with_capacity(n_bins - 1);
    let mut it = 0;

    for n_edge in 0..n_bins - 1 {
        let step = balance.settle(per_bin, n_bins - n_edge);
        // 只在重复值极多时才会越界.
        it = (it + step).min(n - 1);
        let value = s[it];

        // `lb`: `[0, it)` 中第一个不小于 `value` 的位置, 即重复区段的起点.
        let lb = s[..it].partition_point(|x| *x < value);
        if lb != it {
            // `ub`: `[it, n)` 中第一个大于 `value` 的位置.
            let ub = it + s[it..].partition_point(|x| *x <= value);
            if ub == n {
                // 剩余样本全部相等. bin 右侧有一条位于无穷远的边界,
                // 因此只能把边界放在重复区段的起点.
                it = lb;
            } else {
                let lb_dist = it - lb;
                let ub_dist = ub - it;
                // 取调整量更小的一端; 相等时, 若仍欠样本则取 `lb`.
                if lb_dist < ub_dist || (lb_dist == ub_dist && balance.deficit > 0) {
                    it = lb;
                    balance.snap_back(lb_dist);
                } else {
                    it = ub;
                    balance.snap_forward(ub_dist);
                }
            }
        }
        edges.push(s[it]);
    }
    Ok(edges)
}
