//! ROI 列表的文本格式.
//!
//! 每行一个 ROI, 形如 `[x, y, z][sx, sy, sz]`, 即 ITK 打印 `Index` 与 `Size` 的格式.
//! 坐标顺序与 ITK 相同 (x 变化最快), 与 [`Region`] 的 `(z, h, w)` 顺序相反.
//!
//! 读取时只依赖 `[` 和 `,` 定位数值, 其余字符被忽略. 可以跳过第一行作为表头.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::{TextError, TextResult};
use crate::roi::Region;

/// 逐行写出 `rois`.
pub fn write_regions<W: Write>(w: &mut W, rois: &[Region]) -> TextResult<()> {
    for roi in rois {
        let (z, y, x) = roi.index();
        let (sz, sy, sx) = roi.size();
        writeln!(w, "[{x}, {y}, {z}][{sx}, {sy}, {sz}]")?;
    }
    Ok(())
}

/// 将 `rois` 写入路径 `path`.
pub fn write_regions_file<P: AsRef<Path>>(path: P, rois: &[Region]) -> TextResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_regions(&mut w, rois)?;
    w.flush()?;
    Ok(())
}

/// 从 `r` 读取 ROI 列表. `header` 为真时忽略第一行.
pub fn read_regions<R: Read>(mut r: R, header: bool) -> TextResult<Vec<Region>> {
    let mut text = String::new();
    r.read_to_string(&mut text)?;
    parse_regions(&text, header)
}

/// 从路径 `path` 读取 ROI 列表.
pub fn read_regions_file<P: AsRef<Path>>(path: P, header: bool) -> TextResult<Vec<Region>> {
    read_regions(File::open(path)?, header)
}

/// 解析 ROI 列表.
///
/// 末尾不完整的记录被忽略. 记录中出现无法解析的数值 (包括负数) 时返回
/// `Err(TextError::MalformedRegion)`.
pub fn parse_regions(text: &str, header: bool) -> TextResult<Vec<Region>> {
    let mut cur = Cursor {
        s: text.as_bytes(),
        pos: 0,
        line: 1,
    };
    if header {
        cur.skip_past(b'\n');
    }

    let mut rois = vec![];
    while cur.skip_past(b'[') {
        let line = cur.line;
        match cur.record() {
            Field::Value(v) => {
                let [x, y, z, sx, sy, sz] = v;
                rois.push(Region::new((z, y, x), (sz, sy, sx)));
            }
            Field::End => break,
            Field::Malformed => return Err(TextError::MalformedRegion { line }),
        }
    }
    log::debug!("Parsed {} ROIs", rois.len());
    Ok(rois)
}

enum Field<T> {
    Value(T),
    /// 数据在记录中途结束.
    End,
    Malformed,
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
    /// `pos` 所在的行号, 从 1 开始.
    line: usize,
}

impl Cursor<'_> {
    /// 移动到 `to`, 并累计跨过的换行符.
    fn advance(&mut self, to: usize) {
        self.line += self.s[self.pos..to].iter().filter(|&&c| c == b'\n').count();
        self.pos = to;
    }

    /// 跳过下一个 `c` 及其之前的全部字符. 没有 `c` 时移动到末尾并返回 `false`.
    fn skip_past(&mut self, c: u8) -> bool {
        match self.s[self.pos..].iter().position(|&b| b == c) {
            Some(i) => {
                self.advance(self.pos + i + 1);
                true
            }
            None => {
                self.advance(self.s.len());
                false
            }
        }
    }

    fn number(&mut self) -> Field<usize> {
        let blank = self.s[self.pos..]
            .iter()
            .take_while(|c| c.is_ascii_whitespace())
            .count();
        self.advance(self.pos + blank);
        let start = self.pos;
        while self.pos < self.s.len() && self.s[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return if self.pos == self.s.len() {
                Field::End
            } else {
                Field::Malformed
            };
        }
        // 全是 ASCII 数字, 只可能溢出.
        std::str::from_utf8(&self.s[start..self.pos])
            .ok()
            .and_then(|t| t.parse().ok())
            .map_or(Field::Malformed, Field::Value)
    }

    /// 读取开头的 `[` 之后的一条记录: 6 个数值, 分隔符依次为 `,`, `,`, `[`, `,`, `,`.
    fn record(&mut self) -> Field<[usize; 6]> {
        let mut v = [0; 6];
        let separators = [b',', b',', b'[', b',', b',', b'\n'];
        for (slot, sep) in v.iter_mut().zip(separators) {
            match self.number() {
                Field::Value(n) => *slot = n,
                Field::End => return Field::End,
                Field::Malformed => return Field::Malformed,
            }
            if !self.skip_past(sep) && sep != b'\n' {
                return Field::End;
            }
        }
        Field::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let rois = vec![
            Region::new((1, 2, 3), (4, 5, 6)),
            Region::new((0, 0, 0), (41, 41, 41)),
        ];
        let mut buf = vec![];
        write_regions(&mut buf, &rois).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "[3, 2, 1][6, 5, 4]\n[0, 0, 0][41, 41, 41]\n");
        assert_eq!(parse_regions(&text, false).unwrap(), rois);
    }

    #[test]
    fn test_header_and_loose_punctuation() {
        let text = "index size\n[10,20,30][3,3,3]\n  [ 1 , 2 , 3 ] [ 5 , 6 , 7 ]";
        let rois = parse_regions(text, true).unwrap();
        assert_eq!(
            rois,
            vec![
                Region::new((30, 20, 10), (3, 3, 3)),
                Region::new((3, 2, 1), (7, 6, 5)),
            ]
        );
    }

    #[test]
    fn test_partial_trailing_record() {
        let text = "[1, 2, 3][4, 5, 6]\n[7, 8, 9][1";
        assert_eq!(parse_regions(text, false).unwrap().len(), 1);
        assert!(parse_regions("", false).unwrap().is_empty());
        assert!(parse_regions("header only", true).unwrap().is_empty());
    }

    #[test]
    fn test_many_records() {
        let rois: Vec<Region> = (0..100_000)
            .map(|i| Region::new((i % 7, i % 11, i), (41, 41, 41)))
            .collect();
        let mut buf = vec![];
        write_regions(&mut buf, &rois).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(parse_regions(&text, false).unwrap(), rois);

        // 坏记录位于最后一行时, 行号仍然正确.
        let bad = format!("{text}[1, 2, x][4, 5, 6]\n");
        assert!(matches!(
            parse_regions(&bad, false),
            Err(TextError::MalformedRegion { line: 100_001 })
        ));
    }

    #[test]
    fn test_huge_values_are_kept() {
        let rois = parse_regions("[1, 1, 1][18446744073709551615, 1, 1]\n", false).unwrap();
        assert_eq!(rois, vec![Region::new((1, 1, 1), (1, 1, usize::MAX))]);
        assert!(!rois[0].is_inside((4, 4, 4)));
    }

    #[test]
    fn test_malformed_record() {
        let text = "[1, 2, 3][4, 5, 6]\n[1, -2, 3][4, 5, 6]\n";
        assert!(matches!(
            parse_regions(text, false),
            Err(TextError::MalformedRegion { line: 2 })
        ));
    }
}
