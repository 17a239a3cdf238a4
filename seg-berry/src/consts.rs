//! 通用常量.

/// 二值掩膜像素值.
pub mod mask {
    /// 二值化后的背景像素值.
    pub const BINARY_BACKGROUND: u8 = 0;

    /// 二值化后的前景像素值.
    pub const BINARY_FOREGROUND: u8 = 1;

    /// 实例标注像素是否属于前景? 0 为背景, 其余均为实例编号.
    #[inline]
    pub const fn is_foreground(p: u16) -> bool {
        p != 0
    }

    /// 实例标注像素是否属于背景?
    #[inline]
    pub const fn is_background(p: u16) -> bool {
        p == 0
    }
}

/// 默认阈值扫描步长. 对应扫描序列 `0.0, 0.025, ..., 0.975`.
pub const DEFAULT_THRESHOLD_STEP: f32 = 0.025;

/// 语义指标名.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Metric {
    /// Dice 系数.
    Dice,

    /// Intersection over union.
    Iou,

    /// 查准率.
    Precision,

    /// 查全率.
    Recall,
}

impl Metric {
    /// 渲染图例所用的指标名.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dice => "Dice",
            Self::Iou => "IoU",
            Self::Precision => "Precision",
            Self::Recall => "Recall",
        }
    }
}
