//! 输入输出路径.

use std::env;
use std::path::{Path, PathBuf};

/// 输出目录的环境变量.
pub const OUT_DIR_ENV: &str = "LUNG_BERRY_HR2_OUT_DIR";

/// 获取 `.npy` 输出目录.
///
/// 1. 若命令行给出了目录, 则返回它;
/// 2. 若环境变量 `$LUNG_BERRY_HR2_OUT_DIR` 非空, 则返回其值;
/// 3. 否则, 返回 `$HOME/dataset/npy`. 找不到用户主目录时返回 `None`.
pub fn out_dir(arg: Option<String>) -> Option<PathBuf> {
    if let Some(d) = arg {
        return Some(PathBuf::from(d));
    }
    match env::var(OUT_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => {
            let mut ans = dirs::home_dir()?;
            ans.extend(["dataset", "npy"]);
            Some(ans)
        }
    }
}

/// `input` 对应的输出文件: 输出目录下同名 (扩展名为 `npy`) 的文件.
pub fn npy_path<P: AsRef<Path>>(input: P, out_dir: &Path) -> Option<PathBuf> {
    let stem = input.as_ref().file_stem()?;
    let mut ans = out_dir.join(stem);
    ans.set_extension("npy");
    Some(ans)
}
