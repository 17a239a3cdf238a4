//! 复现绘图驱动: 把预计算的 matching 统计表渲染成模型性能图,
//! 多模型时附带 F1 对比图; 若目录下存在语义扫描输入, 再补一张
//! 阈值扫描图.

use seg_berry::plot;
use utils::{loader, sep};

mod runner;

fn main() {
    utils::init_logger();

    let stats_dir = loader::stats_dir_from_env_or_home();
    let fig_dir = utils::fig_dir_from_env_or_cwd();

    sep();
    println!("Stats directory: {}", stats_dir.display());
    println!("Figure directory: {}", fig_dir.display());
    runner::show_palette();
    sep();

    let _style = plot::scoped(utils::benchmark_style());
    runner::run(&stats_dir, &fig_dir);
}
