//! 数据集操作.
//!
//! 提供迭代器风格的数据集获取模式. 数据集是一个目录:
//! 目录下的若干多页 tiff 文件是强度体数据, `labels/`
//! 子目录下是形状匹配的标注体数据, 两边按文件名排序后一一对应.

use std::io;
use std::path::{Path, PathBuf};

use crate::{CellData3d, CellLabel, CellScan, OpenVolumeError};

/// 标注子目录名.
pub const LABEL_SUBDIR: &str = "labels";

/// 判断路径是否是 tiff 文件.
#[inline]
fn is_tiff(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}

/// 列出 `dir` 下所有 tiff 文件的路径, 按文件名升序排序.
///
/// # 注意
///
/// `dir` 必须是目录, 否则程序 panic.
pub fn volume_paths<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    assert!(dir.is_dir());

    let mut paths: Vec<PathBuf> = dir
        .read_dir()?
        .filter_map(|entry| entry.map(|e| e.path()).ok())
        .filter(|p| p.is_file() && is_tiff(p))
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// 列出 `dir/labels` 下所有 tiff 文件的路径, 按文件名升序排序.
///
/// # 注意
///
/// `dir/labels` 必须是目录, 否则程序 panic.
#[inline]
pub fn label_paths<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    volume_paths(dir.as_ref().join(LABEL_SUBDIR))
}

macro_rules! impl_loader {
    ($(#[$outer: meta])* $name: ident, $open: path, $item: ty) => {
        $(#[$outer])*
        #[derive(Debug)]
        pub struct $name {
            paths_rev: Vec<PathBuf>,
        }

        impl $name {
            /// 从给定路径列表创建加载器. 迭代顺序即列表顺序.
            pub fn from_paths<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
                let mut paths_rev: Vec<PathBuf> = paths.into_iter().collect();
                paths_rev.reverse();
                Self { paths_rev }
            }
        }

        impl Iterator for $name {
            type Item = (PathBuf, Result<$item, OpenVolumeError>);

            fn next(&mut self) -> Option<Self::Item> {
                let path = self.paths_rev.pop()?;
                let data = $open(&path);
                Some((path, data))
            }
        }

        impl ExactSizeIterator for $name {
            #[inline]
            fn len(&self) -> usize {
                self.paths_rev.len()
            }
        }
    };
}

impl_loader!(
    /// 3D 强度扫描数据加载器.
    ScanLoader,
    CellScan::open,
    CellScan
);

impl_loader!(
    /// 3D 标注数据加载器.
    LabelLoader,
    CellLabel::open,
    CellLabel
);

/// 从指定数据集目录创建强度扫描 ([`CellScan`]) 加载器.
/// 返回的加载器会按文件名序迭代目录下所有 tiff 体数据.
///
/// # 注意
///
/// `dir` 必须是目录, 否则程序 panic.
pub fn scan_loader<P: AsRef<Path>>(dir: P) -> io::Result<ScanLoader> {
    Ok(ScanLoader::from_paths(volume_paths(dir)?))
}

/// 从指定数据集目录创建标注 ([`CellLabel`]) 加载器.
/// 返回的加载器会按文件名序迭代 `dir/labels` 下所有 tiff 体数据.
///
/// # 注意
///
/// `dir/labels` 必须是目录, 否则程序 panic.
pub fn label_loader<P: AsRef<Path>>(dir: P) -> io::Result<LabelLoader> {
    Ok(LabelLoader::from_paths(label_paths(dir)?))
}

/// 3D 数据集 (扫描 + 标注) 加载器.
#[derive(Debug)]
pub struct PairLoader {
    scan_paths_rev: Vec<PathBuf>,
    label_paths_rev: Vec<PathBuf>,
}

impl Iterator for PairLoader {
    type Item = (PathBuf, Result<CellData3d, OpenVolumeError>);

    fn next(&mut self) -> Option<Self::Item> {
        let scan_path = self.scan_paths_rev.pop()?;
        let label_path = self.label_paths_rev.pop()?;
        let data = CellData3d::open(&scan_path, &label_path);
        Some((scan_path, data))
    }
}

impl ExactSizeIterator for PairLoader {
    #[inline]
    fn len(&self) -> usize {
        self.scan_paths_rev.len()
    }
}

/// 从指定数据集目录创建数据 ([`CellData3d`]) 加载器. 图像与标注按排序后的
/// 文件名顺序逐位配对.
///
/// # 注意
///
/// 1. `dir` 和 `dir/labels` 必须是目录, 否则程序 panic.
/// 2. 图像文件数与标注文件数必须一致, 否则程序 panic.
/// 3. 同位文件必须一一对应, 否则程序行为未定义 (排序对齐由调用方保证).
pub fn pair_loader<P: AsRef<Path>>(dir: P) -> io::Result<PairLoader> {
    let mut scan_paths = volume_paths(dir.as_ref())?;
    let mut label_paths = label_paths(dir.as_ref())?;
    assert_eq!(
        scan_paths.len(),
        label_paths.len(),
        "图像与标注文件数不一致"
    );

    scan_paths.reverse();
    label_paths.reverse();
    Ok(PairLoader {
        scan_paths_rev: scan_paths,
        label_paths_rev: label_paths,
    })
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}
