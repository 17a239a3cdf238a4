//! 指标阈值扫描.
//!
//! 对一张连续取值的预测图, 在阈值序列上逐个二值化 (`value > threshold`),
//! 并计算 Dice / IoU / precision / recall 四项指标.
//! 扫描结果保持输入阈值顺序; 最优阈值按 Dice 最大值定位,
//! 并列时取第一个 (最小索引).

use ndarray::{ArrayView, Dimension};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use thiserror::Error;

use crate::consts::DEFAULT_THRESHOLD_STEP;
use crate::metrics;

/// 阈值扫描错误.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SweepError {
    /// 阈值序列为空, 扫描无意义.
    #[error("empty threshold sequence")]
    EmptyThresholds,
}

static DEFAULT_THRESHOLDS: Lazy<Vec<f32>> = Lazy::new(|| {
    let n = (1.0 / DEFAULT_THRESHOLD_STEP) as usize;
    (0..n).map(|i| i as f32 * DEFAULT_THRESHOLD_STEP).collect()
});

/// 默认阈值序列: `0.0, 0.025, ..., 0.975`.
#[inline]
pub fn default_thresholds() -> &'static [f32] {
    &DEFAULT_THRESHOLDS
}

/// 一次阈值扫描的完整结果. 四个指标序列与 `thresholds` 逐位对齐.
#[derive(Debug, Clone)]
pub struct SweepScores {
    /// 扫描所用阈值, 保持输入顺序.
    pub thresholds: Vec<f32>,

    /// 各阈值下的 Dice 系数.
    pub dice: Vec<f64>,

    /// 各阈值下的 IoU.
    pub iou: Vec<f64>,

    /// 各阈值下的查准率.
    pub precision: Vec<f64>,

    /// 各阈值下的查全率.
    pub recall: Vec<f64>,
}

/// 首次出现的最大值索引. `xs` 非空.
fn arg_max_first(xs: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in xs.iter().enumerate().skip(1) {
        if *v > xs[best] {
            best = i;
        }
    }
    best
}

impl SweepScores {
    /// 取得 Dice 最大的 (阈值, 分数). 并列时取最小索引.
    #[inline]
    pub fn best_dice(&self) -> (f32, f64) {
        let i = arg_max_first(&self.dice);
        (self.thresholds[i], self.dice[i])
    }

    /// 取得 IoU 最大的 (阈值, 分数). 并列时取最小索引.
    #[inline]
    pub fn best_iou(&self) -> (f32, f64) {
        let i = arg_max_first(&self.iou);
        (self.thresholds[i], self.iou[i])
    }

    /// 将 Dice 与 IoU 的最大值及其阈值写进 `w` 中.
    pub fn report_maxima<W: Write>(&self, mut w: W) -> io::Result<()> {
        let (dice_t, dice) = self.best_dice();
        let (iou_t, iou) = self.best_iou();
        writeln!(w, "Max Dice of {dice:.2} @ {dice_t:.2}")?;
        writeln!(w, "Max IoU of {iou:.2} @ {iou_t:.2}")?;
        Ok(())
    }
}

/// 在 `thresholds` 上扫描 `pred`, 以 `gt` (非零为前景) 为真值计算四项指标.
///
/// 两张图形状必须一致, 否则程序 panic. 空阈值序列返回 `Err`.
pub fn evaluate_sweep<D: Dimension>(
    pred: ArrayView<'_, f32, D>,
    gt: ArrayView<'_, u8, D>,
    thresholds: &[f32],
) -> Result<SweepScores, SweepError> {
    if thresholds.is_empty() {
        return Err(SweepError::EmptyThresholds);
    }

    let mut scores = SweepScores {
        thresholds: thresholds.to_vec(),
        dice: Vec::with_capacity(thresholds.len()),
        iou: Vec::with_capacity(thresholds.len()),
        precision: Vec::with_capacity(thresholds.len()),
        recall: Vec::with_capacity(thresholds.len()),
    };

    for &t in thresholds {
        let bin = pred.map(|&v| u8::from(v > t));
        scores.dice.push(metrics::dice_coeff(gt.view(), bin.view()));
        scores
            .iou
            .push(metrics::intersection_over_union(gt.view(), bin.view()));
        scores
            .precision
            .push(metrics::precision(gt.view(), bin.view()));
        scores.recall.push(metrics::recall(gt.view(), bin.view()));
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::{default_thresholds, evaluate_sweep, SweepError, SweepScores};
    use ndarray::array;

    #[test]
    fn test_default_thresholds() {
        let ts = default_thresholds();
        assert_eq!(ts.len(), 40);
        assert_eq!(ts[0], 0.0);
        assert!((ts[1] - 0.025).abs() < 1e-6);
        assert!(*ts.last().unwrap() < 1.0);
    }

    /// 预测恰为真值的 {0,1} 图时, 阈值 0 处四项指标均为 1.0.
    #[test]
    fn test_sweep_perfect_at_zero() {
        let gt = array![[0u8, 1], [1, 0]];
        let pred = array![[0.0f32, 1.0], [1.0, 0.0]];
        let scores = evaluate_sweep(pred.view(), gt.view(), &[0.0, 0.5, 0.99]).unwrap();

        assert_eq!(scores.dice[0], 1.0);
        assert_eq!(scores.iou[0], 1.0);
        assert_eq!(scores.precision[0], 1.0);
        assert_eq!(scores.recall[0], 1.0);

        // 二值化规则是严格大于: 阈值 0.99 仍保留值为 1.0 的前景.
        assert_eq!(scores.dice[2], 1.0);
    }

    /// 最优阈值并列时取第一个.
    #[test]
    fn test_best_dice_tie_break() {
        let scores = SweepScores {
            thresholds: vec![0.0, 0.1, 0.2, 0.3],
            dice: vec![0.5, 0.9, 0.9, 0.2],
            iou: vec![0.5, 0.4, 0.9, 0.9],
            precision: vec![1.0; 4],
            recall: vec![1.0; 4],
        };
        assert_eq!(scores.best_dice(), (0.1, 0.9));
        assert_eq!(scores.best_iou(), (0.2, 0.9));
    }

    #[test]
    fn test_sweep_monotone_case() {
        // 连续预测图: 前景值 0.8, 背景值 0.3.
        let gt = array![[1u8, 1], [0, 0]];
        let pred = array![[0.8f32, 0.8], [0.3, 0.3]];
        let scores = evaluate_sweep(pred.view(), gt.view(), &[0.1, 0.5, 0.9]).unwrap();

        // 阈值 0.1: 全部预测为前景 → recall 1, precision 0.5.
        assert_eq!(scores.recall[0], 1.0);
        assert_eq!(scores.precision[0], 0.5);
        // 阈值 0.5: 恰好分离.
        assert_eq!(scores.dice[1], 1.0);
        // 阈值 0.9: 全部为背景.
        assert_eq!(scores.recall[2], 0.0);
        assert_eq!(scores.best_dice().0, 0.5);
    }

    #[test]
    fn test_sweep_empty_thresholds() {
        let gt = array![[0u8]];
        let pred = array![[0.0f32]];
        assert!(matches!(
            evaluate_sweep(pred.view(), gt.view(), &[]),
            Err(SweepError::EmptyThresholds)
        ));
    }

    /// 写出最大值报告.
    #[test]
    fn test_report_maxima() {
        let scores = SweepScores {
            thresholds: vec![0.0, 0.25],
            dice: vec![0.5, 0.75],
            iou: vec![0.6, 0.4],
            precision: vec![1.0; 2],
            recall: vec![1.0; 2],
        };
        let mut buf = Vec::new();
        scores.report_maxima(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Max Dice of 0.75 @ 0.25\nMax IoU of 0.60 @ 0.00\n");
    }
}
