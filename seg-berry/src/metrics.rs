//! 逐像素语义指标.
//!
//! 所有指标都在一对等形状二值掩膜上计算: 非零为前景, 零为背景.
//! 维度不限 (2D 切片和 3D 体数据都可以).
//!
//! 退化情形的约定 (分母为 0 时):
//!
//! 1. 双方都为空掩膜视为完全一致, Dice / IoU 为 1.0;
//! 2. 预测为空而真值非空时 precision 为 0.0;
//! 3. 真值为空时 recall 为 1.0 (没有要找的目标).
//!
//! 因此所有指标的取值范围恒为 \[0, 1\].

use ndarray::{ArrayView, Dimension, Zip};

/// 逐元素混淆计数: (tp, fp, fn).
///
/// 两个掩膜形状必须一致, 否则程序 panic.
pub(crate) fn confusion<D: Dimension>(
    gt: ArrayView<'_, u8, D>,
    pred: ArrayView<'_, u8, D>,
) -> (u64, u64, u64) {
    assert_eq!(gt.shape(), pred.shape(), "掩膜形状不一致");
    Zip::from(&gt)
        .and(&pred)
        .fold((0u64, 0u64, 0u64), |(tp, fp, fn_), &g, &p| {
            match (g != 0, p != 0) {
                (true, true) => (tp + 1, fp, fn_),
                (false, true) => (tp, fp + 1, fn_),
                (true, false) => (tp, fp, fn_ + 1),
                (false, false) => (tp, fp, fn_),
            }
        })
}

/// Dice 系数: `2|A∩B| / (|A| + |B|)`.
pub fn dice_coeff<D: Dimension>(gt: ArrayView<'_, u8, D>, pred: ArrayView<'_, u8, D>) -> f64 {
    let (tp, fp, fn_) = confusion(gt, pred);
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        1.0
    } else {
        2.0 * tp as f64 / denom as f64
    }
}

/// Intersection over union: `|A∩B| / |A∪B|`.
pub fn intersection_over_union<D: Dimension>(
    gt: ArrayView<'_, u8, D>,
    pred: ArrayView<'_, u8, D>,
) -> f64 {
    let (tp, fp, fn_) = confusion(gt, pred);
    let denom = tp + fp + fn_;
    if denom == 0 {
        1.0
    } else {
        tp as f64 / denom as f64
    }
}

/// 查准率: `tp / (tp + fp)`.
pub fn precision<D: Dimension>(gt: ArrayView<'_, u8, D>, pred: ArrayView<'_, u8, D>) -> f64 {
    let (tp, fp, fn_) = confusion(gt, pred);
    if tp + fp == 0 {
        // 没有任何预测前景: 真值也为空才算对.
        return if fn_ == 0 { 1.0 } else { 0.0 };
    }
    tp as f64 / (tp + fp) as f64
}

/// 查全率: `tp / (tp + fn)`.
pub fn recall<D: Dimension>(gt: ArrayView<'_, u8, D>, pred: ArrayView<'_, u8, D>) -> f64 {
    let (tp, _, fn_) = confusion(gt, pred);
    if tp + fn_ == 0 {
        return 1.0;
    }
    tp as f64 / (tp + fn_) as f64
}
