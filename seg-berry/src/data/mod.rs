use std::fs::File;
use std::io::BufReader;
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3};
use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};

use crate::{Idx2d, Idx3d};

mod save;

pub use save::ImgWriteVis;

/// 打开多页 tiff 体数据时的错误.
#[derive(Debug, Error)]
pub enum OpenVolumeError {
    /// 底层 I/O 错误.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// tiff 解码错误.
    #[error("tiff decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// 页面像素格式无法转换到目标体素类型.
    #[error("unsupported tiff pixel format")]
    UnsupportedPixelFormat,

    /// 第 `.0` 页 (0-based) 的分辨率与第一页不一致.
    #[error("page {0} dimensions differ from the first page")]
    InconsistentPage(usize),
}

/// 可以从一页 tiff 解码结果中构造的体素类型. 仅限内部使用.
trait FromPage: Sized {
    /// 将一页像素转换成目标体素序列. 不支持的格式返回 `None`.
    fn from_page(page: DecodingResult) -> Option<Vec<Self>>;
}

impl FromPage for f32 {
    fn from_page(page: DecodingResult) -> Option<Vec<f32>> {
        match page {
            DecodingResult::U8(v) => Some(v.into_iter().map(f32::from).collect()),
            DecodingResult::U16(v) => Some(v.into_iter().map(f32::from).collect()),
            DecodingResult::F32(v) => Some(v),
            _ => None,
        }
    }
}

impl FromPage for u16 {
    fn from_page(page: DecodingResult) -> Option<Vec<u16>> {
        match page {
            DecodingResult::U8(v) => Some(v.into_iter().map(u16::from).collect()),
            DecodingResult::U16(v) => Some(v),
            _ => None,
        }
    }
}

/// 将多页 tiff 文件读成 (z, H, W) 格式的 3D 数组. 页序即 z 序.
fn open_volume<T: FromPage, P: AsRef<Path>>(path: P) -> Result<Array3<T>, OpenVolumeError> {
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let (w, h) = decoder.dimensions()?;
    let (w, h) = (w as usize, h as usize);

    let mut buf: Vec<T> = Vec::new();
    let mut pages = 0usize;
    loop {
        let (pw, ph) = decoder.dimensions()?;
        if (pw as usize, ph as usize) != (w, h) {
            return Err(OpenVolumeError::InconsistentPage(pages));
        }
        let page = decoder.read_image()?;
        let mut data =
            T::from_page(page).ok_or(OpenVolumeError::UnsupportedPixelFormat)?;
        buf.append(&mut data);
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    // 每页形状都已校验过, 该操作不会生成 `Err`, 可直接 unwrap.
    Ok(Array3::from_shape_vec((pages, h, w), buf).unwrap())
}

/// 多页 tiff 格式的 3D 显微强度扫描. 强度值以 `f32` 保存,
/// 第 0 维是切片轴 (z), 访问模式为 (z, H, W).
#[derive(Debug, Clone)]
pub struct CellScan {
    data: Array3<f32>,
}

/// 多页 tiff 格式的 3D 实例标注. 标签值以 `u16` 保存, 0 为背景,
/// 非零值为实例编号. 访问模式为 (z, H, W).
#[derive(Debug, Clone)]
pub struct CellLabel {
    data: Array3<u16>,
}

macro_rules! impl_volume_common {
    ($name: ident, $elem: ty) => {
        impl Index<Idx3d> for $name {
            type Output = $elem;

            #[inline]
            fn index(&self, index: Idx3d) -> &Self::Output {
                &self.data[index]
            }
        }

        impl IndexMut<Idx3d> for $name {
            #[inline]
            fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
                &mut self.data[index]
            }
        }

        impl $name {
            /// 打开多页 tiff 格式的体数据文件. `path` 为文件的本地路径.
            /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
            pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenVolumeError> {
                let data = open_volume(path)?;
                Ok(Self { data })
            }

            /// 从裸数据直接创建实体. `data` 按照 (z, H, W) 组织.
            #[inline]
            pub fn from_array(data: Array3<$elem>) -> Self {
                Self { data }
            }

            /// 获取数据形状大小, 格式为 (z, H, W).
            #[inline]
            pub fn shape(&self) -> Idx3d {
                let &[z, h, w] = self.data.shape() else {
                    unreachable!()
                };
                (z, h, w)
            }

            /// 获取数据水平切片形状大小.
            #[inline]
            pub fn slice_shape(&self) -> Idx2d {
                let (_, h, w) = self.shape();
                (h, w)
            }

            /// 获取水平切片个数.
            #[inline]
            pub fn len_z(&self) -> usize {
                self.shape().0
            }

            /// 获取数据体素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (z, h, w) = self.shape();
                z * h * w
            }

            /// 获取 z 空间的第 `z_index` 层切片视图.
            ///
            /// 当 `z_index` 越界时 panic.
            #[inline]
            pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, $elem> {
                self.data.index_axis(Axis(0), z_index)
            }

            /// 获取能按升序迭代水平切片的迭代器.
            #[inline]
            pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, $elem>> {
                self.data.axis_iter(Axis(0))
            }

            /// 获得数据的一份不可变 shallow copy.
            #[inline]
            pub fn data(&self) -> ArrayView<'_, $elem, Ix3> {
                self.data.view()
            }

            /// 获得数据的一份可变 shallow copy.
            #[inline]
            pub fn data_mut(&mut self) -> ArrayViewMut<'_, $elem, Ix3> {
                self.data.view_mut()
            }

            /// 取出底层 3D 数组.
            #[inline]
            pub fn into_data(self) -> Array3<$elem> {
                self.data
            }
        }
    };
}

impl_volume_common!(CellScan, f32);
impl_volume_common!(CellLabel, u16);

impl CellLabel {
    /// 获取标注中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u16) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取前景 (非零) 体素个数.
    #[inline]
    pub fn foreground_size(&self) -> usize {
        self.data
            .iter()
            .filter(|p| crate::consts::mask::is_foreground(**p))
            .count()
    }

    /// 将标注二值化: 背景为 0, 任意实例为 1.
    pub fn binarize(&self) -> Array3<u8> {
        use crate::consts::mask;
        self.data.map(|&p| {
            if mask::is_foreground(p) {
                mask::BINARY_FOREGROUND
            } else {
                mask::BINARY_BACKGROUND
            }
        })
    }
}

/// 3D 显微强度扫描与对应的实例标注.
///
/// 该结构完全透明, 仅包含两个公开的 `scan` 和 `label` 子结构,
/// 用户可以直接使用它们来实现相关上层功能.
#[derive(Debug, Clone)]
pub struct CellData3d {
    /// 3D 强度扫描.
    pub scan: CellScan,

    /// 3D 实例标注.
    pub label: CellLabel,
}

impl CellData3d {
    /// 分别打开多页 tiff 格式的强度扫描和对应标注. 如果任一文件打开失败, 则返回 `Err`.
    /// 若两个文件的数据形状不一致, 则程序 panic.
    pub fn open(
        scan_path: impl AsRef<Path>,
        label_path: impl AsRef<Path>,
    ) -> Result<Self, OpenVolumeError> {
        let scan = CellScan::open(scan_path.as_ref())?;
        let label = CellLabel::open(label_path.as_ref())?;
        assert_eq!(scan.shape(), label.shape(), "扫描和标注形状不一致");
        Ok(Self { scan, label })
    }

    /// 从裸数据直接创建实体. 若两个数组形状不一致, 则程序 panic.
    pub fn from_arrays(scan: Array3<f32>, label: Array3<u16>) -> Self {
        assert_eq!(scan.shape(), label.shape(), "扫描和标注形状不一致");
        Self {
            scan: CellScan::from_array(scan),
            label: CellLabel::from_array(label),
        }
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.label.len_z()
    }

    /// 依次获取强度扫描和标注 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> (ArrayView2<'_, f32>, ArrayView2<'_, u16>) {
        (self.scan.slice_at(z_index), self.label.slice_at(z_index))
    }

    /// 获取能按升序迭代 (扫描, 标注) 水平切片的迭代器.
    #[inline]
    pub fn slice_iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, u16>)> {
        self.scan.slice_iter().zip(self.label.slice_iter())
    }
}
