//! 程序运行函数.

use std::fs;
use std::path::{Path, PathBuf};

use lung_berry::io::hr2::{self, Hr2Error};
use ndarray_npy::WriteNpyError;
use thiserror::Error;

use crate::loader;

/// 转换错误.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 命令行参数错误.
    #[error("usage: convert-hr2 <input.hr2> [out-dir]")]
    Usage,

    /// 无法安装日志记录器.
    #[error("cannot install logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// 找不到输出目录.
    #[error("cannot determine output directory")]
    NoOutDir,

    /// 读取 HR2 文件错误.
    #[error("{}: {}", .0.display(), .1)]
    Hr2(PathBuf, #[source] Hr2Error),

    /// 写出 `.npy` 文件错误.
    #[error("{}: {}", .0.display(), .1)]
    Npy(PathBuf, #[source] WriteNpyError),

    /// 创建输出目录错误.
    #[error("{}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
}

/// 实际运行: 读取 `input`, 转换为 `(z, h, w)` 三维数组后写入输出目录.
///
/// 返回输出文件路径.
pub fn run(input: &Path, out_dir: Option<String>) -> Result<PathBuf, ConvertError> {
    let out_dir = loader::out_dir(out_dir).ok_or(ConvertError::NoOutDir)?;
    let output = loader::npy_path(input, &out_dir).ok_or(ConvertError::Usage)?;

    let volume = hr2::read_hr2(input).map_err(|e| ConvertError::Hr2(input.to_owned(), e))?;
    let header = volume.header();
    log::info!(
        "{}: size = {:?}, origin = {:?}, spacing = {:?}",
        input.display(),
        header.size,
        header.origin,
        header.spacing
    );
    let array = volume
        .into_array3()
        .map_err(|e| ConvertError::Hr2(input.to_owned(), e))?;

    fs::create_dir_all(&out_dir).map_err(|e| ConvertError::Io(out_dir.clone(), e))?;
    ndarray_npy::write_npy(&output, &array).map_err(|e| ConvertError::Npy(output.clone(), e))?;
    log::info!("Wrote {:?} to {}", array.dim(), output.display());
    Ok(output)
}
