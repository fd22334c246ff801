//! 固定边界的稠密直方图.

use std::fmt;

use itertools::Itertools;

/// 由一组递增的边界 `e_0 < e_1 < ... < e_{n-2}` 确定 `n` 个 bin 的直方图:
/// `(-inf, e_0], (e_0, e_1], ..., (e_{n-2}, inf)`.
///
/// 允许相邻边界相等 (均衡边界估计在重复值极多时会产生这种边界), 此时夹在中间的
/// bin 永远为空.
///
/// 边界在构建后不可变, 计数可以通过 [`DenseHistogram::reset_counts`] 清零后复用.
///
/// 计数向量由单一调用者独占. 若要在多个线程中并行统计, 每个线程应持有自己的实例
/// (可以直接 `clone`).
#[derive(Debug, Clone, PartialEq)]
pub struct DenseHistogram<T> {
    edges: Vec<T>,
    counts: Vec<u32>,
}

impl<T: PartialOrd + Copy> DenseHistogram<T> {
    /// 以边界 `edges` 构建直方图.
    ///
    /// 如果 `edges` 为空, 含有 NaN (与自身不可比较的值) 或不是升序的, 则返回 `None`.
    pub fn new(edges: Vec<T>) -> Option<Self> {
        if edges.is_empty()
            || edges.iter().any(|e| e.partial_cmp(e).is_none())
            || !edges.windows(2).all(|w| w[0] <= w[1])
        {
            return None;
        }
        let counts = vec![0; edges.len() + 1];
        Some(Self { edges, counts })
    }

    /// 将 `value` 放入满足 `左边界 < value <= 右边界` 的 bin 中.
    ///
    /// 大于最后一条边界的值落入最后一个 (右侧无界的) bin.
    #[inline]
    pub fn insert(&mut self, value: T) {
        let bin = self.edges.partition_point(|e| *e < value);
        self.counts[bin] += 1;
    }

    /// 依次放入 `it` 给出的所有值.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, it: I) {
        for v in it {
            self.insert(v);
        }
    }

    /// 原始计数.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// 计数总和.
    #[inline]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| *c as u64).sum()
    }

    /// 计数清零, 边界保持不变.
    #[inline]
    pub fn reset_counts(&mut self) {
        self.counts.fill(0);
    }

    /// bin 的个数, 即边界个数加一.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// 边界.
    #[inline]
    pub fn edges(&self) -> &[T] {
        &self.edges
    }
}

macro_rules! impl_frequencies {
    ($fp: ty) => {
        impl DenseHistogram<$fp> {
            /// 各 bin 计数除以计数总和.
            ///
            /// 计数全为零时结果为 NaN, 调用者应自行避免.
            pub fn frequencies(&self) -> Vec<$fp> {
                let sum = self.total() as $fp;
                self.counts.iter().map(|c| *c as $fp / sum).collect()
            }
        }
    };
}

impl_frequencies!(f32);
impl_frequencies!(f64);

impl<T> fmt::Display for DenseHistogram<T> {
    /// 以逗号分隔输出计数.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.counts.iter().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: [f32; 18] = [
        -1.0, 0.0, 0.5, 1.0, 1.5, 2.1, 2.6, 2.9, 3.2, 3.5, 4.2, 4.6, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
    ];

    fn filled() -> DenseHistogram<f32> {
        let mut hist = DenseHistogram::new(vec![1.0, 2.5, 3.0, 4.7, 6.2, 8.3]).unwrap();
        hist.extend(VALUES);
        hist
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_counts() {
        let hist = filled();
        assert_eq!(hist.num_bins(), 7);
        assert_eq!(hist.counts(), &[4, 2, 2, 4, 2, 2, 2]);
        assert_eq!(hist.total(), 18);
    }

    #[test]
    fn test_frequencies() {
        let expected = [4.0, 2.0, 2.0, 4.0, 2.0, 2.0, 2.0].map(|c: f32| c / 18.0);
        let actual = filled().frequencies();
        assert_eq!(actual.len(), 7);
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(float_eq(*a, *e));
        }
    }

    #[test]
    fn test_value_on_edge_goes_left() {
        let mut hist = DenseHistogram::new(vec![0.0f64, 1.0]).unwrap();
        hist.extend([0.0, 1.0, 1.0 + f64::EPSILON, f64::NEG_INFINITY, f64::INFINITY]);
        assert_eq!(hist.counts(), &[2, 1, 2]);
    }

    #[test]
    fn test_reset_counts_keeps_edges() {
        let mut hist = filled();
        hist.reset_counts();
        assert_eq!(hist.counts(), &[0; 7]);
        assert_eq!(hist.edges(), &[1.0, 2.5, 3.0, 4.7, 6.2, 8.3]);

        hist.insert(3.0);
        assert_eq!(hist.counts(), &[0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_histogram_frequencies_are_nan() {
        let hist = DenseHistogram::new(vec![0.0f32]).unwrap();
        assert!(hist.frequencies().iter().all(|f| f.is_nan()));
    }

    #[test]
    fn test_invalid_edges() {
        assert!(DenseHistogram::<f32>::new(vec![]).is_none());
        assert!(DenseHistogram::new(vec![2.0, 1.0]).is_none());
        assert!(DenseHistogram::new(vec![1.0, f32::NAN]).is_none());
        assert!(DenseHistogram::new(vec![f32::NAN]).is_none());
        assert!(DenseHistogram::new(vec![f64::NAN, 1.0]).is_none());
    }

    #[test]
    fn test_repeated_edges() {
        let mut hist = DenseHistogram::new(vec![1.0f32, 1.0, 2.0]).unwrap();
        hist.extend([0.5, 1.0, 1.5, 3.0]);
        assert_eq!(hist.counts(), &[2, 0, 1, 1]);
    }

    #[test]
    fn test_display() {
        assert_eq!(filled().to_string(), "4,2,2,4,2,2,2");
    }
}
