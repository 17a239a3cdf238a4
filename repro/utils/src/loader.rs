//! 对 `seg-berry::dataset` 的更一层封装. 提供更直接的数据集加载器.

use seg_berry::dataset::{self, PairLoader};
use std::env;
use std::path::{Path, PathBuf};

/// 获取细胞分割训练集基本路径.
///
/// 1. 若环境变量 `$CELLSEG_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cellseg/train`.
pub fn data_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("CELLSEG_DATA_DIR") {
        PathBuf::from(d)
    } else {
        dataset::home_dataset_dir_with(["cellseg", "train"]).unwrap()
    }
}

/// 获取 (图像, 标注) 体数据对加载器.
pub fn pair_loader<P: AsRef<Path>>(path: P) -> std::io::Result<PairLoader> {
    dataset::pair_loader(path)
}

/// 从 `$CELLSEG_DATA_DIR` 或者 `$HOME/dataset/cellseg/train` 下创建体数据对加载器.
#[inline]
pub fn pair_loader_from_env_or_home() -> std::io::Result<PairLoader> {
    pair_loader(data_dir_from_env_or_home())
}

/// 获取模型统计表目录.
///
/// 1. 若环境变量 `$CELLSEG_STATS_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cellseg/stats`.
pub fn stats_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("CELLSEG_STATS_DIR") {
        PathBuf::from(d)
    } else {
        dataset::home_dataset_dir_with(["cellseg", "stats"]).unwrap()
    }
}
