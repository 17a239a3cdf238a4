//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{CellData3d, CellLabel, CellScan, ImgWriteVis, OpenVolumeError};

pub use crate::consts::mask::{BINARY_BACKGROUND, BINARY_FOREGROUND};
pub use crate::consts::{Metric, DEFAULT_THRESHOLD_STEP};

pub use crate::dataset::{self, home_dataset_dir_with};

pub use crate::convert::{flatten_paired, flatten_volumes, SliceStack};
pub use crate::split::{split_trailing, TrainValSplit};

pub use crate::metrics::{dice_coeff, intersection_over_union, precision, recall};
pub use crate::sweep::{default_thresholds, evaluate_sweep, SweepScores};

pub use crate::stats::{MatchingStats, StatKind, StatsTable};
pub use crate::plot::{PlotStyle, PngRenderer, StatsRenderer};

pub use crate::train::{ModelTrainer, TrainConfig, TrainJob};
