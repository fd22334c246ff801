//! 将 HR2 体数据转换为 `.npy` 数组.
//!
//! 用法: `convert-hr2 <input.hr2> [out-dir]`. 输出目录的确定方式见
//! [`loader::out_dir`].

mod loader;
mod runner;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use runner::ConvertError;

fn convert() -> Result<PathBuf, ConvertError> {
    simple_logger::init_with_level(log::Level::Info)?;

    let mut args = env::args().skip(1);
    let input = args.next().map(PathBuf::from).ok_or(ConvertError::Usage)?;
    runner::run(&input, args.next())
}

fn main() -> ExitCode {
    match convert() {
        Ok(out) => {
            println!("{}", out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("convert-hr2: {e}");
            ExitCode::FAILURE
        }
    }
}
