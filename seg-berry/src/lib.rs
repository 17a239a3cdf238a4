#![warn(missing_docs)]

//! 核心库. 为细胞分割 benchmark 复现工作提供 3D 显微数据的结构化信息和基础处理算法.
//!
//! 该 crate 只提供 `safe` 接口, 并且完全单线程同步执行.
//!
//! # 注意
//!
//! 1. 数据源按照 "目录下若干多页 tiff 体数据 + `labels/` 子目录下同名标注"
//!   的模式组织, 图像与标注按文件名排序后一一对应 (排序对齐由调用方保证).
//! 2. 在非期望输入下 (形状不一致, 文件数不一致, 非法比例等),
//!   程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 功能
//!
//! ### 体数据模型与 tiff 读取 ✅
//!
//! 实现位于 `seg-berry/src/data`.
//!
//! ### 数据集目录加载器 ✅
//!
//! 迭代器风格的数据集获取模式. 实现位于 `seg-berry/src/dataset`.
//!
//! ### 3D → 2D 切片展平与名字簿记 ✅
//!
//! 保序展平, 并派生 `{stem}_{index}` 形式的逐切片标识符.
//! 实现位于 `seg-berry/src/convert.rs`.
//!
//! ### 训练/验证尾部划分 ✅
//!
//! `n_val = max(1, round(fraction * len))`, 验证集取尾部.
//! 实现位于 `seg-berry/src/split.rs`.
//!
//! ### 逐像素语义指标与阈值扫描 ✅
//!
//! Dice / IoU / precision / recall, 以及在阈值序列上的扫描与最优阈值定位.
//! 实现位于 `seg-berry/src/{metrics,sweep}.rs`.
//!
//! ### matching 统计表与图像渲染 ✅
//!
//! 预计算的 (model, threshold) 聚合统计记录的表格化与 plotters 渲染.
//! 实现位于 `seg-berry/src/{stats.rs,plot}`.
//!
//! ### 训练分发 ✅
//!
//! 将切片数据交给外部训练后端 (capability trait), 本库不关心其内部语义.
//! 实现位于 `seg-berry/src/train`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D 显微体数据基础结构.
pub mod data;

pub use data::{CellData3d, CellLabel, CellScan, ImgWriteVis, OpenVolumeError};

pub mod consts;
pub mod convert;
pub mod dataset;
pub mod metrics;
pub mod plot;
pub mod prelude;
pub mod split;
pub mod stats;
pub mod sweep;
pub mod train;
