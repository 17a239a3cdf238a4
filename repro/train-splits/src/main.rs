//! 复现训练驱动: 加载 3D 数据集, 展平并按尾部比例切分,
//! 然后把数据交给外部训练程序.
//!
//! 参数与原始 benchmark 保持一致, 全部硬编码为常量.

use seg_berry::train::{self, ModelTrainer, TrainConfig};
use utils::{loader, sep};

mod trainer;

/// 验证集尾部比例.
const VAL_FRACTION: f64 = 0.8;

/// 产出模型文件名.
const SAVE_NAME: &str = "c1245_v_2080.cellpose";

/// 目标细胞平均直径 (像素).
const CELL_MEAN_DIAM: f64 = 3.3;

/// 训练轮数.
const N_EPOCHS: u32 = 50;

/// 保存间隔 (轮).
const SAVE_EVERY: u32 = 50;

/// 训练通道.
const CHANNELS: [u32; 2] = [0, 0];

fn main() {
    utils::init_logger();

    let data_path = loader::data_dir_from_env_or_home();
    assert!(data_path.is_dir(), "数据集目录不存在");

    let cfg = TrainConfig {
        val_fraction: VAL_FRACTION,
        save_name: SAVE_NAME.to_owned(),
        mean_diameter: CELL_MEAN_DIAM,
        n_epochs: N_EPOCHS,
        save_every: SAVE_EVERY,
        channels: CHANNELS,
        save_path: data_path.join("models"),
        data_path,
    };

    sep();
    println!("Validation fraction: {VAL_FRACTION}");
    println!("Model name: {SAVE_NAME}");
    println!("Mean diameter: {CELL_MEAN_DIAM}");
    println!("Epochs: {N_EPOCHS} (save every {SAVE_EVERY})");
    println!("Channels: {CHANNELS:?}");
    sep();

    let (scans, labels, names) = train::load_dataset(&cfg.data_path).expect("数据集加载失败");
    let job = train::build_job(&scans, &labels, &names, cfg.val_fraction);

    println!("Train files ({}):", job.n_train());
    for name in &job.train_names {
        println!("    {name}");
    }
    println!("Validation files ({}):", job.n_val());
    for name in &job.val_names {
        println!("    {name}");
    }
    sep();

    let backend = trainer::CmdTrainer::from_env_or_default();
    let model = backend.train(&job, &cfg).expect("训练失败");
    println!("Model saved to {}", model.display());
}
