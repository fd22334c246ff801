//! 读写: HR2 体数据, ROI 列表, 直方图边界规格, 以及 bag 矩阵.
//!
//! 除 HR2 外都是简单的 ASCII 文本格式.

use thiserror::Error;

pub mod hist_spec;
pub mod hr2;
pub mod roi_text;
pub mod text;

/// 文本格式读写错误.
#[derive(Error, Debug)]
pub enum TextError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 第 `line` 行 (从 1 开始) 存在无法解析的数值.
    #[error("line {line}: malformed number '{token}'")]
    MalformedNumber {
        /// 行号.
        line: usize,
        /// 无法解析的内容.
        token: String,
    },

    /// 第 `line` 行 (从 1 开始) 不是完整的 ROI 记录.
    #[error("line {line}: malformed region record")]
    MalformedRegion {
        /// 行号.
        line: usize,
    },

    /// 第 `histogram` 个直方图 (从 0 开始) 的 bin 个数与第一个直方图不同.
    #[error("histogram {histogram} has {got} bins, expected {expected}")]
    BinCountMismatch {
        /// 第一个直方图的 bin 个数.
        expected: usize,
        /// 实际 bin 个数.
        got: usize,
        /// 直方图序号.
        histogram: usize,
    },
}

/// 文本格式读写结果.
pub type TextResult<T> = Result<T, TextError>;
