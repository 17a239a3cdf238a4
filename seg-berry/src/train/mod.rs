//! 训练驱动.
//!
//! 本模块不实现任何学习算法, 只负责把 3D 数据集整理成训练后端
//! 能消费的形式: 加载 (图像, 标注) 体数据对, 沿 z 轴展平成 2D
//! 切片, 按尾部比例切出验证集, 再把整理好的 [`TrainJob`] 连同
//! 超参数 ([`TrainConfig`]) 交给 [`ModelTrainer`] 实现.
//!
//! 训练后端是不透明的: 它如何消费数据, 训练多久, 产出什么中间
//! 文件, 本模块一概不关心, 只要求最终返回模型文件路径.

use log::info;
use ndarray::{Array2, Array3};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::convert::flatten_paired;
use crate::data::OpenVolumeError;
use crate::dataset;
use crate::split::split_trailing;

/// 训练驱动错误.
#[derive(Debug, Error)]
pub enum TrainError {
    /// 数据集目录枚举失败.
    #[error("数据集枚举失败: {0}")]
    Io(#[from] std::io::Error),

    /// 体数据读取失败.
    #[error("体数据读取失败: {0}")]
    Volume(#[from] OpenVolumeError),

    /// 训练后端自身的失败, 以文本形式透传.
    #[error("训练后端失败: {0}")]
    Backend(String),
}

/// 训练超参数与路径配置.
///
/// 字段语义与取值范围由训练后端解释, 本模块原样转交.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// 验证集尾部比例, 语义见 [`split_trailing`].
    pub val_fraction: f64,

    /// 产出模型的文件名.
    pub save_name: String,

    /// 目标结构的平均直径 (像素).
    pub mean_diameter: f64,

    /// 训练轮数.
    pub n_epochs: u32,

    /// 每隔多少轮保存一次.
    pub save_every: u32,

    /// 训练通道选择.
    pub channels: [u32; 2],

    /// 数据集根目录 (图像在根下, 标注在 `labels/` 子目录).
    pub data_path: PathBuf,

    /// 模型输出目录.
    pub save_path: PathBuf,
}

/// 整理完毕, 可直接交给训练后端的数据.
///
/// 四个切片序列两两平行: 图像与标注逐位对应, 标识符与切片逐位
/// 对应. 训练集在前, 验证集取自展平序列的尾部.
#[derive(Debug, Clone)]
pub struct TrainJob {
    /// 训练集图像切片.
    pub train_images: Vec<Array2<f32>>,

    /// 训练集标注切片.
    pub train_labels: Vec<Array2<u16>>,

    /// 训练集切片标识符.
    pub train_names: Vec<String>,

    /// 验证集图像切片.
    pub val_images: Vec<Array2<f32>>,

    /// 验证集标注切片.
    pub val_labels: Vec<Array2<u16>>,

    /// 验证集切片标识符.
    pub val_names: Vec<String>,
}

impl TrainJob {
    /// 训练集切片数.
    #[inline]
    pub fn n_train(&self) -> usize {
        self.train_images.len()
    }

    /// 验证集切片数.
    #[inline]
    pub fn n_val(&self) -> usize {
        self.val_images.len()
    }
}

/// 训练后端能力接口.
///
/// 实现者拿到整理好的数据与超参数, 完成训练并返回产出模型的
/// 文件路径. 后端内部失败以 [`TrainError::Backend`] 上报.
pub trait ModelTrainer {
    /// 执行一次完整训练.
    fn train(&self, job: &TrainJob, cfg: &TrainConfig) -> Result<PathBuf, TrainError>;
}

/// 把体数据序列整理成 [`TrainJob`]: 展平, 派生标识符, 按尾部
/// 比例切分.
///
/// # 先决条件 (违反则 panic)
///
/// 1. `scans`, `labels`, `names` 个数一致, 且每对体数据切片数一致;
/// 2. 展平后至少一张切片;
/// 3. `0 < fraction <= 1`.
pub fn build_job(
    scans: &[Array3<f32>],
    labels: &[Array3<u16>],
    names: &[PathBuf],
    fraction: f64,
) -> TrainJob {
    let (xs, ys) = flatten_paired::<f32, f32, u16, u16>(scans, labels, Some(names));
    let split = split_trailing(xs.len(), fraction);
    let names = xs.names.expect("给定源标识时展平结果必然携带标识符");

    let (train_images, val_images) = split.partition(&xs.slices);
    let (train_labels, val_labels) = split.partition(&ys.slices);
    let (train_names, val_names) = split.partition(&names);

    info!(
        "数据集整理完毕: 训练切片 {} 张, 验证切片 {} 张",
        train_images.len(),
        val_images.len()
    );

    TrainJob {
        train_images,
        train_labels,
        train_names,
        val_images,
        val_labels,
        val_names,
    }
}

/// 加载数据集目录下的全部 (图像, 标注) 体数据对.
///
/// 返回三个平行序列: 图像体数据, 标注体数据, 源文件路径.
/// 配对规则与 panic 条件见 [`dataset::pair_loader`].
pub fn load_dataset<P: AsRef<Path>>(
    data_path: P,
) -> Result<(Vec<Array3<f32>>, Vec<Array3<u16>>, Vec<PathBuf>), TrainError> {
    let loader = dataset::pair_loader(data_path)?;
    let mut scans = Vec::with_capacity(loader.len());
    let mut labels = Vec::with_capacity(loader.len());
    let mut names = Vec::with_capacity(loader.len());

    for (path, data) in loader {
        let data = data?;
        info!("已加载 {} ({} 张切片)", path.display(), data.scan.len_z());
        scans.push(data.scan.into_data());
        labels.push(data.label.into_data());
        names.push(path);
    }
    Ok((scans, labels, names))
}

/// 端到端训练入口: 加载数据集, 整理 [`TrainJob`], 调用后端.
///
/// 返回后端产出的模型文件路径.
pub fn run<T: ModelTrainer>(trainer: &T, cfg: &TrainConfig) -> Result<PathBuf, TrainError> {
    let (scans, labels, names) = load_dataset(&cfg.data_path)?;
    let job = build_job(&scans, &labels, &names, cfg.val_fraction);
    info!(
        "开始训练: 模型 {}, {} 轮, 平均直径 {}",
        cfg.save_name, cfg.n_epochs, cfg.mean_diameter
    );
    trainer.train(&job, cfg)
}

#[cfg(test)]
mod tests {
    use super::{build_job, run, ModelTrainer, TrainConfig, TrainError, TrainJob};
    use ndarray::Array3;
    use std::path::{Path, PathBuf};

    fn volume(z: usize, fill: f32) -> Array3<f32> {
        Array3::from_elem((z, 2, 2), fill)
    }

    fn label_volume(z: usize, fill: u16) -> Array3<u16> {
        Array3::from_elem((z, 2, 2), fill)
    }

    fn config(data_path: &Path, save_path: &Path) -> TrainConfig {
        TrainConfig {
            val_fraction: 0.8,
            save_name: "demo.model".to_owned(),
            mean_diameter: 3.3,
            n_epochs: 50,
            save_every: 50,
            channels: [0, 0],
            data_path: data_path.to_owned(),
            save_path: save_path.to_owned(),
        }
    }

    /// 记录收到的切片数并返回固定路径的桩后端.
    struct MockTrainer;

    impl ModelTrainer for MockTrainer {
        fn train(&self, job: &TrainJob, cfg: &TrainConfig) -> Result<PathBuf, TrainError> {
            assert_eq!(job.n_train() + job.n_val(), job.train_names.len() + job.val_names.len());
            Ok(cfg.save_path.join(&cfg.save_name))
        }
    }

    #[test]
    fn test_build_job_split_and_names() {
        let scans = [volume(3, 0.5), volume(2, 1.0)];
        let labels = [label_volume(3, 1), label_volume(2, 0)];
        let names = [PathBuf::from("a.tif"), PathBuf::from("b.tif")];

        // 5 张切片, 0.8 比例: 验证集 4 张 (尾部), 训练集 1 张.
        let job = build_job(&scans, &labels, &names, 0.8);
        assert_eq!(job.n_train(), 1);
        assert_eq!(job.n_val(), 4);
        assert_eq!(job.train_names, ["a_0"]);
        assert_eq!(job.val_names, ["a_1", "a_2", "b_0", "b_1"]);
        assert_eq!(job.train_labels.len(), 1);
        assert_eq!(job.val_labels.len(), 4);
    }

    #[test]
    fn test_build_job_full_val() {
        let scans = [volume(2, 0.0)];
        let labels = [label_volume(2, 0)];
        let names = [PathBuf::from("v.tif")];

        let job = build_job(&scans, &labels, &names, 1.0);
        assert_eq!(job.n_train(), 0);
        assert_eq!(job.n_val(), 2);
    }

    #[test]
    #[should_panic]
    fn test_build_job_mismatched_pair() {
        let scans = [volume(3, 0.0)];
        let labels = [label_volume(2, 0)];
        let names = [PathBuf::from("v.tif")];
        build_job(&scans, &labels, &names, 0.5);
    }

    #[test]
    fn test_run_with_mock_backend() {
        use crate::data::CellData3d;
        use crate::dataset::LABEL_SUBDIR;

        let dir = tempfile::tempdir().unwrap();
        let save_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(LABEL_SUBDIR)).unwrap();

        // 写一个最小数据集: 单体数据, 2 张 2x2 切片.
        let data = CellData3d::from_arrays(volume(2, 0.25), label_volume(2, 1));
        write_tiff_f32(&dir.path().join("v1.tif"), data.scan.data());
        write_tiff_u16(
            &dir.path().join(LABEL_SUBDIR).join("v1.tif"),
            data.label.data(),
        );

        let cfg = config(dir.path(), save_dir.path());
        let model = run(&MockTrainer, &cfg).unwrap();
        assert_eq!(model, save_dir.path().join("demo.model"));
    }

    fn write_tiff_f32(path: &Path, volume: ndarray::ArrayView3<'_, f32>) {
        use tiff::encoder::{colortype, TiffEncoder};
        let file = std::fs::File::create(path).unwrap();
        let mut enc = TiffEncoder::new(file).unwrap();
        for page in volume.outer_iter() {
            let page: Vec<f32> = page.iter().copied().collect();
            enc.write_image::<colortype::Gray32Float>(2, 2, &page).unwrap();
        }
    }

    fn write_tiff_u16(path: &Path, volume: ndarray::ArrayView3<'_, u16>) {
        use tiff::encoder::{colortype, TiffEncoder};
        let file = std::fs::File::create(path).unwrap();
        let mut enc = TiffEncoder::new(file).unwrap();
        for page in volume.outer_iter() {
            let page: Vec<u16> = page.iter().copied().collect();
            enc.write_image::<colortype::Gray16>(2, 2, &page).unwrap();
        }
    }
}
