//! 程序运行函数.

use log::{info, warn};
use seg_berry::plot::{PngRenderer, StatsRenderer};
use seg_berry::stats::{StatKind, StatsTable};
use seg_berry::sweep::{self, default_thresholds};
use seg_berry::{CellLabel, CellScan};
use std::io;
use std::path::{Path, PathBuf};

/// 统计表文件名后缀. `<model>_stats.csv` 中去掉后缀即模型名.
const STATS_SUFFIX: &str = "_stats.csv";

/// matching 统计对应的实例匹配指标, 只进图像标题.
const MATCH_METRIC: &str = "IoU";

/// 语义扫描输入: 概率图与真值, 可选存在.
const PRED_FILE: &str = "prediction.tif";
const GT_FILE: &str = "ground_truth.tif";

/// 枚举 `dir` 下的全部统计表, 返回按模型名排序的 (模型名, 路径) 序列.
pub fn discover_stats<P: AsRef<Path>>(dir: P) -> io::Result<Vec<(String, PathBuf)>> {
    let mut found: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?;
            let model = name.strip_suffix(STATS_SUFFIX)?;
            Some((model.to_owned(), p.clone()))
        })
        .collect();
    found.sort();
    Ok(found)
}

/// 实际运行: 逐模型渲染统计图, 多模型时补一张 F1 对比图,
/// 若语义扫描输入存在则附带阈值扫描.
pub fn run(stats_dir: &Path, fig_dir: &Path) {
    assert!(stats_dir.is_dir(), "统计表目录不存在");
    std::fs::create_dir_all(fig_dir).expect("输出目录创建失败");

    let found = discover_stats(stats_dir).expect("统计表枚举失败");
    assert!(!found.is_empty(), "目录下没有 `<model>_stats.csv` 统计表");

    let renderer = PngRenderer::new(fig_dir);
    let mut tables = Vec::with_capacity(found.len());
    let mut models = Vec::with_capacity(found.len());

    for (model, path) in &found {
        let table = StatsTable::from_csv_path(path).expect("统计表解析失败");
        let out = renderer
            .render_performance(&table, model, MATCH_METRIC)
            .expect("统计图渲染失败");
        info!("已渲染 {}", out.display());
        tables.push(table);
        models.push(model.as_str());
    }

    if tables.len() >= 2 {
        let out = renderer
            .render_stat_comparison(&tables, &models, StatKind::F1, MATCH_METRIC)
            .expect("对比图渲染失败");
        info!("已渲染 {}", out.display());
    } else {
        info!("单模型输入, 跳过对比图");
    }

    semantic_sweep(stats_dir, fig_dir);
}

/// 可选的语义阈值扫描: 只有当概率图与真值体数据同时存在时执行.
fn semantic_sweep(stats_dir: &Path, fig_dir: &Path) {
    let pred_path = stats_dir.join(PRED_FILE);
    let gt_path = stats_dir.join(GT_FILE);
    if !pred_path.is_file() || !gt_path.is_file() {
        info!("未发现语义扫描输入, 跳过");
        return;
    }

    let pred = match CellScan::open(&pred_path) {
        Ok(v) => v,
        Err(e) => {
            warn!("概率图读取失败, 跳过扫描: {e}");
            return;
        }
    };
    let gt = match CellLabel::open(&gt_path) {
        Ok(v) => v,
        Err(e) => {
            warn!("真值读取失败, 跳过扫描: {e}");
            return;
        }
    };

    let gt_bin = gt.binarize();
    let scores = sweep::evaluate_sweep(pred.data(), gt_bin.view(), default_thresholds())
        .expect("阈值序列非空");
    scores
        .report_maxima(io::stdout().lock())
        .expect("扫描结果输出失败");

    let out = fig_dir.join("semantic_sweep.png");
    seg_berry::plot::render_sweep(&scores, "semantic segmentation", &out).expect("扫描图渲染失败");
    info!("已渲染 {}", out.display());
}

/// 在终端打印当前调色板色样, 方便快速核对样式.
pub fn show_palette() {
    let style = utils::benchmark_style();
    for (i, c) in style.palette.iter().enumerate() {
        print!("\x1b[48;2;{};{};{}m  \x1b[0m", c.0, c.1, c.2);
        if i + 1 == style.palette.len() {
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::discover_stats;

    #[test]
    fn test_discover_stats_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["m2_stats.csv", "m1_stats.csv", "notes.txt", "m3.csv"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let found = discover_stats(dir.path()).unwrap();
        let models: Vec<&str> = found.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(models, ["m1", "m2"]);
        assert!(found.iter().all(|(_, p)| p.extension().unwrap() == "csv"));
    }

    #[test]
    fn test_discover_stats_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_stats(dir.path()).unwrap().is_empty());
    }
}
