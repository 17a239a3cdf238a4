//! 外部命令训练后端.
//!
//! 训练本体是一个外部程序 (默认 `cellpose_train`). 本模块把整理好
//! 的切片落盘成 `.npy` 暂存目录, 再以命令行参数转交超参数, 最后
//! 用退出码判定成败. 外部程序内部做什么, 这里不做任何假设.

use log::info;
use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use seg_berry::train::{ModelTrainer, TrainConfig, TrainError, TrainJob};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 暂存目录下的四个切片子目录与两份标识符清单.
const TRAIN_IMAGES: &str = "train_images";
const TRAIN_LABELS: &str = "train_labels";
const VAL_IMAGES: &str = "val_images";
const VAL_LABELS: &str = "val_labels";
const TRAIN_MANIFEST: &str = "train_names.txt";
const VAL_MANIFEST: &str = "val_names.txt";

/// 以子进程方式调用外部训练程序的后端.
pub struct CmdTrainer {
    program: PathBuf,
}

impl CmdTrainer {
    /// 创建后端. `program` 是外部训练程序的可执行路径.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 从 `$CELLSEG_TRAINER` 或默认程序名创建后端.
    pub fn from_env_or_default() -> Self {
        match std::env::var("CELLSEG_TRAINER") {
            Ok(p) => Self::new(p),
            Err(_) => Self::new("cellpose_train"),
        }
    }
}

fn npy_err(e: ndarray_npy::WriteNpyError) -> TrainError {
    TrainError::Backend(format!("npy 暂存失败: {e}"))
}

/// 把一组切片按标识符逐张写成 `dir/{name}.npy`.
fn stage_slices<T: ndarray_npy::WritableElement>(
    dir: &Path,
    slices: &[Array2<T>],
    names: &[String],
) -> Result<(), TrainError> {
    fs::create_dir_all(dir)?;
    for (slice, name) in slices.iter().zip(names) {
        let file = File::create(dir.join(format!("{name}.npy")))?;
        slice.write_npy(file).map_err(npy_err)?;
    }
    Ok(())
}

/// 写标识符清单, 每行一个, 顺序与切片序一致.
fn stage_manifest(path: &Path, names: &[String]) -> Result<(), TrainError> {
    let mut f = File::create(path)?;
    for name in names {
        writeln!(f, "{name}")?;
    }
    Ok(())
}

/// 把整个 [`TrainJob`] 落盘到 `staging` 目录.
fn stage_job(staging: &Path, job: &TrainJob) -> Result<(), TrainError> {
    stage_slices(&staging.join(TRAIN_IMAGES), &job.train_images, &job.train_names)?;
    stage_slices(&staging.join(TRAIN_LABELS), &job.train_labels, &job.train_names)?;
    stage_slices(&staging.join(VAL_IMAGES), &job.val_images, &job.val_names)?;
    stage_slices(&staging.join(VAL_LABELS), &job.val_labels, &job.val_names)?;
    stage_manifest(&staging.join(TRAIN_MANIFEST), &job.train_names)?;
    stage_manifest(&staging.join(VAL_MANIFEST), &job.val_names)?;
    Ok(())
}

impl ModelTrainer for CmdTrainer {
    fn train(&self, job: &TrainJob, cfg: &TrainConfig) -> Result<PathBuf, TrainError> {
        let staging = cfg.save_path.join("staging");
        stage_job(&staging, job)?;
        info!(
            "切片已暂存至 {} ({} 训练, {} 验证)",
            staging.display(),
            job.n_train(),
            job.n_val()
        );

        let status = Command::new(&self.program)
            .arg("--data-dir")
            .arg(&staging)
            .arg("--diam-mean")
            .arg(cfg.mean_diameter.to_string())
            .arg("--n-epochs")
            .arg(cfg.n_epochs.to_string())
            .arg("--save-every")
            .arg(cfg.save_every.to_string())
            .arg("--chan")
            .arg(cfg.channels[0].to_string())
            .arg("--chan2")
            .arg(cfg.channels[1].to_string())
            .arg("--model-name")
            .arg(&cfg.save_name)
            .arg("--save-path")
            .arg(&cfg.save_path)
            .status()?;

        if !status.success() {
            return Err(TrainError::Backend(format!("训练进程异常退出: {status}")));
        }
        Ok(cfg.save_path.join(&cfg.save_name))
    }
}
