//! 复现脚本依赖的通用组件.

use seg_berry::plot::PlotStyle;
use std::env;
use std::path::PathBuf;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) {
    writeln!(&mut w, "{SEP}").unwrap();
}

/// 初始化复现脚本统一的日志器. 重复调用只生效一次.
pub fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init();
}

/// 获取图像输出目录.
///
/// 1. 若环境变量 `$CELLSEG_FIG_DIR` 非空, 则返回其值;
/// 2. 否则, 返回当前目录下的 `figures`.
pub fn fig_dir_from_env_or_cwd() -> PathBuf {
    if let Ok(d) = env::var("CELLSEG_FIG_DIR") {
        PathBuf::from(d)
    } else {
        PathBuf::from("figures")
    }
}

/// 创建复现图像统一的渲染样式: 200 DPI, 15pt 基准字号, 浅色背景.
#[inline]
pub fn benchmark_style() -> PlotStyle {
    PlotStyle::default()
}
