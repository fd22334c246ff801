//! 直方图边界规格文件.
//!
//! 纯文本, 每行一个直方图的边界, 以逗号分隔. 以 `#` 开头的行被跳过,
//! 第一个空行结束读取. 写出时先写两行注释: 特征名称与尺度.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use super::text::{parse_sequence, write_sequence};
use super::{TextError, TextResult};
use crate::consts::FEATURE_NAMES;

/// 读取直方图规格. 所有直方图的 bin 个数必须相同.
pub fn read_spec<R: BufRead>(r: R) -> TextResult<Vec<Vec<f32>>> {
    let mut spec: Vec<Vec<f32>> = vec![];
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            log::warn!("Empty line {} ends the histogram specification", i + 1);
            break;
        }
        if line.starts_with('#') {
            log::debug!("Skipping line {}", i + 1);
            continue;
        }

        let edges = parse_sequence(line, i + 1)?;
        if let Some(first) = spec.first() {
            if first.len() != edges.len() {
                return Err(TextError::BinCountMismatch {
                    expected: first.len() + 1,
                    got: edges.len() + 1,
                    histogram: spec.len(),
                });
            }
        }
        spec.push(edges);
    }
    Ok(spec)
}

/// 从路径 `path` 读取直方图规格.
pub fn read_spec_file<P: AsRef<Path>>(path: P) -> TextResult<Vec<Vec<f32>>> {
    read_spec(BufReader::new(File::open(path)?))
}

/// 写出直方图规格. `spec` 按 `scale * NUM_FEATURES + feature` 排列.
pub fn write_spec<W: Write>(w: &mut W, scales: &[f64], spec: &[Vec<f32>]) -> TextResult<()> {
    writeln!(w, "# Features: {}", FEATURE_NAMES.iter().join(" "))?;
    writeln!(w, "# Scales: {}", scales.iter().join(" "))?;
    for edges in spec {
        write_sequence(w, edges)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// 将直方图规格写入路径 `path`.
pub fn write_spec_file<P: AsRef<Path>>(path: P, scales: &[f64], spec: &[Vec<f32>]) -> TextResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_spec(&mut w, scales, spec)?;
    w.flush()?;
    Ok(())
}
