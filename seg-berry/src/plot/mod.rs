//! 图像渲染.
//!
//! 所有图以 PNG 位图落盘 (plotters `BitMapBackend`), 样式取自
//! [`style::current`] 的线程局部快照. 三类图:
//!
//! 1. 语义阈值扫描图 ([`render_sweep`]): 四条指标曲线 +
//!    最优 Dice 阈值处的虚线标记与注释;
//! 2. 单模型 matching 统计图 ([`render_performance`]): 左面板统计曲线,
//!    右面板 fp/tp/fn 原始计数;
//! 3. 多模型单统计对比图 ([`render_stat_comparison`]).
//!
//! 坐标范围, 刻度间距与图例位置都是固定的呈现选择, 不做计算.

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consts::Metric;
use crate::stats::{StatKind, StatsTable, COUNT_CURVES, CURVE_STATS};
use crate::sweep::SweepScores;

pub mod style;

pub use style::{scoped, PlotStyle, StyleGuard};

/// 渲染错误.
#[derive(Debug, Error)]
pub enum PlotError {
    /// 统计表格为空, 无曲线可画.
    #[error("empty stats table")]
    EmptyTable,

    /// 扫描结果为空, 无曲线可画.
    #[error("empty sweep result")]
    EmptySweep,

    /// 模型个数与模型名个数不一致.
    #[error("{tables} tables but {names} model names")]
    ModelCountMismatch {
        /// 表格个数.
        tables: usize,
        /// 模型名个数.
        names: usize,
    },

    /// 底层绘图后端错误.
    #[error("plotting backend error: {0}")]
    Backend(String),
}

/// 将任意后端错误折叠成 [`PlotError::Backend`].
#[inline]
fn backend<E: Display>(e: E) -> PlotError {
    PlotError::Backend(e.to_string())
}

/// 渲染语义阈值扫描图: Dice / IoU / precision / recall 四条曲线,
/// 以及最优 Dice 阈值处的虚线标记与 `Max Dice @ t` 注释.
///
/// 7×7 英寸图幅. `name` 进入标题 `Model performance for {name}`.
pub fn render_sweep(scores: &SweepScores, name: &str, out: &Path) -> Result<(), PlotError> {
    if scores.thresholds.is_empty() {
        return Err(PlotError::EmptySweep);
    }
    let style = style::current();
    let fg = style.foreground();

    let root = BitMapBackend::new(out, style.fig_size(7.0, 7.0)).into_drawing_area();
    root.fill(&style.background()).map_err(backend)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Model performance for {name}"),
            ("sans-serif", style.title_font()).into_font().color(&fg),
        )
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0f32..1f32, 0f64..1.05f64)
        .map_err(backend)?;

    chart
        .configure_mesh()
        .x_desc("Threshold")
        .y_desc("Score")
        .axis_desc_style(("sans-serif", style.label_font()).into_font().color(&fg))
        .label_style(("sans-serif", style.legend_font()).into_font().color(&fg))
        .axis_style(fg)
        .draw()
        .map_err(backend)?;

    let curves: [(Metric, &[f64]); 4] = [
        (Metric::Dice, &scores.dice),
        (Metric::Iou, &scores.iou),
        (Metric::Precision, &scores.precision),
        (Metric::Recall, &scores.recall),
    ];
    for (i, (metric, ys)) in curves.into_iter().enumerate() {
        let color = style.color(i);
        let points: Vec<(f32, f64)> = scores
            .thresholds
            .iter()
            .copied()
            .zip(ys.iter().copied())
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(backend)?
            .label(metric.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    // 最优阈值虚线标记.
    let (best_t, _) = scores.best_dice();
    chart
        .draw_series(DashedLineSeries::new(
            [(best_t, 0.0), (best_t, 1.05)],
            6,
            6,
            fg.stroke_width(1),
        ))
        .map_err(backend)?;
    chart
        .draw_series(std::iter::once(Text::new(
            format!("Max Dice @ {best_t:.2}"),
            (best_t, 0.02),
            ("sans-serif", style.legend_font()).into_font().color(&fg),
        )))
        .map_err(backend)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(style.background().mix(0.8))
        .border_style(fg)
        .label_font(("sans-serif", style.legend_font()).into_font().color(&fg))
        .draw()
        .map_err(backend)?;

    root.present().map_err(backend)
}

/// 单模型 matching 统计图的左面板: 七条统计曲线.
fn draw_stat_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    table: &StatsTable,
    metric: &str,
    style: &PlotStyle,
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let fg = style.foreground();
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0.05f64..0.95f64, -0.1f64..1.1f64)
        .map_err(backend)?;

    chart
        .configure_mesh()
        .x_labels(9)
        .y_labels(13)
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .x_desc(format!("{metric} threshold τ"))
        .y_desc("Metric value")
        .axis_desc_style(("sans-serif", style.label_font()).into_font().color(&fg))
        .label_style(("sans-serif", style.legend_font()).into_font().color(&fg))
        .axis_style(fg)
        .bold_line_style(fg.mix(0.2))
        .light_line_style(fg.mix(0.05))
        .draw()
        .map_err(backend)?;

    let thresholds = table.thresholds();
    for (i, stat) in CURVE_STATS.into_iter().enumerate() {
        let color = style.color(i);
        let points: Vec<(f64, f64)> = thresholds
            .iter()
            .copied()
            .zip(table.column(stat))
            .collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(backend)?
            .label(stat.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(backend)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(style.background().mix(0.8))
        .border_style(fg)
        .label_font(("sans-serif", style.legend_font()).into_font().color(&fg))
        .draw()
        .map_err(backend)
}

/// 单模型 matching 统计图的右面板: fp / tp / fn 原始计数曲线.
fn draw_count_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    table: &StatsTable,
    metric: &str,
    style: &PlotStyle,
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let fg = style.foreground();

    let y_max = COUNT_CURVES
        .into_iter()
        .flat_map(|c| table.counts(c))
        .max()
        .unwrap_or(0)
        .max(1) as f64
        * 1.05;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0.05f64..0.95f64, 0f64..y_max)
        .map_err(backend)?;

    chart
        .configure_mesh()
        .x_labels(9)
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(format!("{metric} threshold τ"))
        .y_desc("Number #")
        .axis_desc_style(("sans-serif", style.label_font()).into_font().color(&fg))
        .label_style(("sans-serif", style.legend_font()).into_font().color(&fg))
        .axis_style(fg)
        .bold_line_style(fg.mix(0.2))
        .light_line_style(fg.mix(0.05))
        .draw()
        .map_err(backend)?;

    let thresholds = table.thresholds();
    for (i, count) in COUNT_CURVES.into_iter().enumerate() {
        let color = style.color(i);
        let points: Vec<(f64, f64)> = thresholds
            .iter()
            .copied()
            .zip(table.counts(count).into_iter().map(|v| v as f64))
            .collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(backend)?
            .label(count.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(backend)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(style.background().mix(0.8))
        .border_style(fg)
        .label_font(("sans-serif", style.legend_font()).into_font().color(&fg))
        .draw()
        .map_err(backend)
}

/// 渲染单模型 matching 统计图: 左面板七条统计曲线, 右面板原始计数.
///
/// 16×6 英寸图幅, 横轴固定 0.05–0.95, 左面板纵轴固定 −0.1–1.1.
/// `metric` 进入横轴标题 (如 `IoU threshold τ`), `name` 进入总标题.
pub fn render_performance(
    table: &StatsTable,
    name: &str,
    metric: &str,
    out: &Path,
) -> Result<(), PlotError> {
    if table.is_empty() {
        return Err(PlotError::EmptyTable);
    }
    let style = style::current();
    let fg = style.foreground();

    let root = BitMapBackend::new(out, style.fig_size(16.0, 6.0)).into_drawing_area();
    root.fill(&style.background()).map_err(backend)?;
    let root = root
        .titled(
            name,
            ("sans-serif", style.title_font()).into_font().color(&fg),
        )
        .map_err(backend)?;

    let panels = root.split_evenly((1, 2));
    draw_stat_panel(&panels[0], table, metric, &style)?;
    draw_count_panel(&panels[1], table, metric, &style)?;

    root.present().map_err(backend)
}

/// 渲染多模型单统计对比图: 每个模型一条曲线, 图例为模型名,
/// 标题为统计名的标题形式 (如 `F1 comparison`).
///
/// 12×6 英寸图幅, 横轴固定 0.05–0.95, 纵轴固定 0–1.
///
/// # 错误
///
/// 1. `tables` 为空或任一表格为空: [`PlotError::EmptyTable`];
/// 2. 表格数与模型名数不一致: [`PlotError::ModelCountMismatch`].
pub fn render_stat_comparison(
    tables: &[StatsTable],
    model_names: &[&str],
    stat: StatKind,
    metric: &str,
    out: &Path,
) -> Result<(), PlotError> {
    if tables.is_empty() || tables.iter().any(StatsTable::is_empty) {
        return Err(PlotError::EmptyTable);
    }
    if tables.len() != model_names.len() {
        return Err(PlotError::ModelCountMismatch {
            tables: tables.len(),
            names: model_names.len(),
        });
    }
    let style = style::current();
    let fg = style.foreground();
    let stat_title = stat.title();

    let root = BitMapBackend::new(out, style.fig_size(12.0, 6.0)).into_drawing_area();
    root.fill(&style.background()).map_err(backend)?;
    let root = root
        .titled(
            &format!("{stat_title} comparison"),
            ("sans-serif", style.title_font()).into_font().color(&fg),
        )
        .map_err(backend)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0.05f64..0.95f64, 0f64..1f64)
        .map_err(backend)?;

    chart
        .configure_mesh()
        .x_labels(9)
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .x_desc(format!("{metric} threshold τ"))
        .y_desc(stat_title.clone())
        .axis_desc_style(("sans-serif", style.label_font()).into_font().color(&fg))
        .label_style(("sans-serif", style.legend_font()).into_font().color(&fg))
        .axis_style(fg)
        .bold_line_style(fg.mix(0.2))
        .light_line_style(fg.mix(0.05))
        .draw()
        .map_err(backend)?;

    for (i, (table, model)) in tables.iter().zip(model_names).enumerate() {
        let color = style.color(i);
        let points: Vec<(f64, f64)> = table
            .thresholds()
            .into_iter()
            .zip(table.column(stat))
            .collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(backend)?
            .label(*model)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(backend)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(style.background().mix(0.8))
        .border_style(fg)
        .label_font(("sans-serif", style.legend_font()).into_font().color(&fg))
        .draw()
        .map_err(backend)?;

    root.present().map_err(backend)
}

/// 将统计表格渲染成图像文件的能力接口.
///
/// 任何具体绘图后端都可以实现该接口; 本库自带 PNG 位图实现
/// ([`PngRenderer`]).
pub trait StatsRenderer {
    /// 渲染单模型统计图. 返回落盘后的文件路径.
    fn render_performance(
        &self,
        table: &StatsTable,
        name: &str,
        metric: &str,
    ) -> Result<PathBuf, PlotError>;

    /// 渲染多模型单统计对比图. 返回落盘后的文件路径.
    fn render_stat_comparison(
        &self,
        tables: &[StatsTable],
        model_names: &[&str],
        stat: StatKind,
        metric: &str,
    ) -> Result<PathBuf, PlotError>;
}

/// 基于 plotters 位图后端的 PNG 渲染器. 输出文件写入固定目录.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    out_dir: PathBuf,
}

impl PngRenderer {
    /// 创建渲染器. `out_dir` 是输出目录, 渲染时必须已存在.
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// 由图名派生输出文件路径. 空格替换为下划线.
    fn path_for(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{}.png", stem.replace(' ', "_")))
    }
}

impl StatsRenderer for PngRenderer {
    fn render_performance(
        &self,
        table: &StatsTable,
        name: &str,
        metric: &str,
    ) -> Result<PathBuf, PlotError> {
        let out = self.path_for(&format!("{name}_performance"));
        render_performance(table, name, metric, &out)?;
        Ok(out)
    }

    fn render_stat_comparison(
        &self,
        tables: &[StatsTable],
        model_names: &[&str],
        stat: StatKind,
        metric: &str,
    ) -> Result<PathBuf, PlotError> {
        let out = self.path_for(&format!("{}_comparison", stat.as_str()));
        render_stat_comparison(tables, model_names, stat, metric, &out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        render_performance, render_stat_comparison, render_sweep, PlotError, PngRenderer,
        StatsRenderer,
    };
    use crate::stats::{MatchingStats, StatKind, StatsTable};
    use crate::sweep::SweepScores;

    fn record(thresh: f64) -> MatchingStats {
        MatchingStats {
            thresh,
            precision: 0.9,
            recall: 0.8,
            accuracy: 0.7,
            f1: 0.85,
            mean_true_score: 0.6,
            mean_matched_score: 0.75,
            panoptic_quality: 0.5,
            tp: 40,
            fp: 5,
            false_neg: 10,
            n_true: 50,
            n_pred: 45,
        }
    }

    fn table() -> StatsTable {
        StatsTable::from_records((1..10).map(|i| record(i as f64 / 10.0)))
    }

    fn scores() -> SweepScores {
        SweepScores {
            thresholds: vec![0.0, 0.25, 0.5, 0.75],
            dice: vec![0.2, 0.9, 0.9, 0.3],
            iou: vec![0.1, 0.8, 0.85, 0.2],
            precision: vec![0.5, 0.9, 1.0, 1.0],
            recall: vec![1.0, 0.9, 0.8, 0.2],
        }
    }

    /// 良构输入下三类渲染都不得失败.
    #[test]
    fn test_render_well_formed() {
        let dir = tempfile::tempdir().unwrap();

        let sweep_out = dir.path().join("sweep.png");
        render_sweep(&scores(), "model A", &sweep_out).unwrap();
        assert!(sweep_out.exists());

        let renderer = PngRenderer::new(dir.path());
        let perf = renderer
            .render_performance(&table(), "model A", "IoU")
            .unwrap();
        assert!(perf.exists());
        assert!(perf.file_name().unwrap().to_string_lossy().ends_with(".png"));

        let cmp = renderer
            .render_stat_comparison(
                &[table(), table()],
                &["model A", "model B"],
                StatKind::F1,
                "IoU",
            )
            .unwrap();
        assert!(cmp.exists());
        assert_eq!(cmp.file_name().unwrap(), "f1_comparison.png");
    }

    #[test]
    fn test_render_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.png");

        let empty = StatsTable::default();
        assert!(matches!(
            render_performance(&empty, "m", "IoU", &out),
            Err(PlotError::EmptyTable)
        ));
        assert!(matches!(
            render_stat_comparison(&[], &[], StatKind::F1, "IoU", &out),
            Err(PlotError::EmptyTable)
        ));

        let scores = SweepScores {
            thresholds: vec![],
            dice: vec![],
            iou: vec![],
            precision: vec![],
            recall: vec![],
        };
        assert!(matches!(
            render_sweep(&scores, "m", &out),
            Err(PlotError::EmptySweep)
        ));
    }

    #[test]
    fn test_render_model_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.png");
        let err =
            render_stat_comparison(&[table()], &["a", "b"], StatKind::F1, "IoU", &out).unwrap_err();
        assert!(matches!(
            err,
            PlotError::ModelCountMismatch { tables: 1, names: 2 }
        ));
    }
}
