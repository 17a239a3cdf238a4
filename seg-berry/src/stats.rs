//! matching 统计记录与表格化.
//!
//! 每条记录对应一个 (model, threshold) 组合下的数据集级聚合统计,
//! 由外部实例匹配流程 **预先算好** (本库不做任何实例匹配计算),
//! 以 CSV 形式落盘后在这里加载成按阈值排序的表格, 供绘图使用.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// 一条数据集级 matching 聚合统计记录.
///
/// 字段集与常见实例匹配工具的数据集级输出对齐.
/// `fn` 是 Rust 关键字, 因此字段名为 `false_neg`, 序列化名保持 `fn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingStats {
    /// 匹配所用的重叠阈值 τ.
    pub thresh: f64,

    /// 实例级查准率.
    pub precision: f64,

    /// 实例级查全率.
    pub recall: f64,

    /// 实例级准确率.
    pub accuracy: f64,

    /// 实例级 F1.
    pub f1: f64,

    /// 每个真值实例的平均匹配分数 (未匹配按 0 计).
    pub mean_true_score: f64,

    /// 已匹配实例对的平均匹配分数.
    pub mean_matched_score: f64,

    /// Panoptic quality.
    pub panoptic_quality: f64,

    /// 匹配成功的实例对数.
    pub tp: u64,

    /// 误报实例数.
    pub fp: u64,

    /// 漏检实例数.
    #[serde(rename = "fn")]
    pub false_neg: u64,

    /// 真值实例总数.
    pub n_true: u64,

    /// 预测实例总数.
    pub n_pred: u64,
}

/// 可绘制的统计曲线列.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StatKind {
    /// 实例级查准率.
    Precision,

    /// 实例级查全率.
    Recall,

    /// 实例级准确率.
    Accuracy,

    /// 实例级 F1.
    F1,

    /// 每个真值实例的平均匹配分数.
    MeanTrueScore,

    /// 已匹配实例对的平均匹配分数.
    MeanMatchedScore,

    /// Panoptic quality.
    PanopticQuality,
}

/// 单模型统计图的固定曲线集合, 按绘制顺序排列.
pub const CURVE_STATS: [StatKind; 7] = [
    StatKind::Precision,
    StatKind::Recall,
    StatKind::Accuracy,
    StatKind::F1,
    StatKind::MeanTrueScore,
    StatKind::MeanMatchedScore,
    StatKind::PanopticQuality,
];

impl StatKind {
    /// 统计列的序列化标识符.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::Accuracy => "accuracy",
            Self::F1 => "f1",
            Self::MeanTrueScore => "mean_true_score",
            Self::MeanMatchedScore => "mean_matched_score",
            Self::PanopticQuality => "panoptic_quality",
        }
    }

    /// 标识符的标题形式: 首字母大写, 下划线转空格.
    /// 如 `panoptic_quality` → `Panoptic quality`.
    pub fn title(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        let head = chars.next().map(|c| c.to_ascii_uppercase());
        head.into_iter()
            .chain(chars)
            .map(|c| if c == '_' { ' ' } else { c })
            .collect()
    }

    /// 从记录中取出本列的值.
    #[inline]
    pub fn value(&self, r: &MatchingStats) -> f64 {
        match self {
            Self::Precision => r.precision,
            Self::Recall => r.recall,
            Self::Accuracy => r.accuracy,
            Self::F1 => r.f1,
            Self::MeanTrueScore => r.mean_true_score,
            Self::MeanMatchedScore => r.mean_matched_score,
            Self::PanopticQuality => r.panoptic_quality,
        }
    }
}

/// 可绘制的原始计数列.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CountKind {
    /// 误报实例数. 绘制顺序在前, 与原图保持一致.
    Fp,

    /// 匹配成功的实例对数.
    Tp,

    /// 漏检实例数.
    Fn,
}

/// 计数面板的固定曲线集合, 按绘制顺序排列.
pub const COUNT_CURVES: [CountKind; 3] = [CountKind::Fp, CountKind::Tp, CountKind::Fn];

impl CountKind {
    /// 计数列的序列化标识符.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fp => "fp",
            Self::Tp => "tp",
            Self::Fn => "fn",
        }
    }

    /// 从记录中取出本列的值.
    #[inline]
    pub fn value(&self, r: &MatchingStats) -> u64 {
        match self {
            Self::Fp => r.fp,
            Self::Tp => r.tp,
            Self::Fn => r.false_neg,
        }
    }
}

/// 按阈值升序排列的统计记录表格.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    records: Vec<MatchingStats>,
}

impl StatsTable {
    /// 从记录集合构建表格. 记录会按阈值升序重排.
    pub fn from_records<I: IntoIterator<Item = MatchingStats>>(records: I) -> Self {
        let mut records: Vec<MatchingStats> = records.into_iter().collect();
        records.sort_by_key(|r| OrderedFloat(r.thresh));
        Self { records }
    }

    /// 从 CSV 读取器加载表格. CSV 必须带表头, 列名与字段序列化名一致.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv = csv::Reader::from_reader(reader);
        let records: Result<Vec<MatchingStats>, _> = csv.deserialize().collect();
        Ok(Self::from_records(records?))
    }

    /// 从 CSV 文件加载表格.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let mut csv = csv::Reader::from_path(path)?;
        let records: Result<Vec<MatchingStats>, _> = csv.deserialize().collect();
        Ok(Self::from_records(records?))
    }

    /// 记录条数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 表格是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全部记录, 按阈值升序.
    #[inline]
    pub fn records(&self) -> &[MatchingStats] {
        &self.records
    }

    /// 阈值列, 升序.
    pub fn thresholds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.thresh).collect()
    }

    /// 提取一列统计值, 与阈值列逐位对齐.
    pub fn column(&self, stat: StatKind) -> Vec<f64> {
        self.records.iter().map(|r| stat.value(r)).collect()
    }

    /// 提取一列计数值, 与阈值列逐位对齐.
    pub fn counts(&self, count: CountKind) -> Vec<u64> {
        self.records.iter().map(|r| count.value(r)).collect()
    }
}
