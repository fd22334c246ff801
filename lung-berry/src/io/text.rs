//! 逗号分隔的数值序列与矩阵.

use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use itertools::Itertools;
use ndarray::ArrayView2;

use super::{TextError, TextResult};

/// 将 `it` 以逗号分隔写出, 不换行.
pub fn write_sequence<W, I>(w: &mut W, it: I) -> TextResult<()>
where
    W: Write,
    I: IntoIterator,
    I::Item: Display,
{
    write!(w, "{}", it.into_iter().join(","))?;
    Ok(())
}

/// 将矩阵逐行写出, 列之间以逗号分隔, 每行以 `\n` 结尾.
pub fn write_matrix<W: Write, T: Display>(w: &mut W, m: ArrayView2<T>) -> TextResult<()> {
    for row in m.rows() {
        write_sequence(w, row.iter())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// 解析第 `line` 行 (从 1 开始, 仅用于报错) 的逗号分隔序列.
///
/// 元素两侧的空白被忽略, 空元素 (例如行尾多余的逗号) 被跳过.
pub fn parse_sequence<T: FromStr>(s: &str, line: usize) -> TextResult<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse().map_err(|_| TextError::MalformedNumber {
                line,
                token: t.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_write_sequence() {
        let mut buf = vec![];
        write_sequence(&mut buf, [1.5f32, -2.0, 0.25]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1.5,-2,0.25");

        let mut buf = vec![];
        write_sequence(&mut buf, Vec::<u32>::new()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_matrix() {
        let m = array![[0.5f32, 0.5, 0.0], [1.0, 0.0, 0.0]];
        let mut buf = vec![];
        write_matrix(&mut buf, m.view()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0.5,0.5,0\n1,0,0\n");
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence::<f32>("1, 2.5,-3,", 1).unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(parse_sequence::<f32>("", 1).unwrap().is_empty());
        assert!(matches!(
            parse_sequence::<f32>("1,x", 7),
            Err(TextError::MalformedNumber { line: 7, token }) if token == "x"
        ));
    }
}
