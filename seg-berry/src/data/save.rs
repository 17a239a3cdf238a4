//! 切片的持久化预览存储.

use image::ImageResult;
use ndarray::ArrayView2;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的切片对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 对于实例标注切片,
/// 所有实例会被映射为白色前景; 对于强度扫描切片,
/// 强度范围会被 min-max 归一化到 8-bit 灰度.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将切片保存到 `path` 路径.
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 所有非零实例映射为白色, 背景为黑色.
impl ImgWriteVis for ArrayView2<'_, u16> {
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let &[h, w] = self.shape() else { unreachable!() };
        let mut buf = image::GrayImage::new(w as u32, h as u32);
        for ((y, x), &pix) in self.indexed_iter() {
            let gray = if crate::consts::mask::is_foreground(pix) {
                u8::MAX
            } else {
                u8::MIN
            };
            buf.put_pixel(x as u32, y as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

/// 按切片自身的强度范围做 min-max 归一化.
impl ImgWriteVis for ArrayView2<'_, f32> {
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let &[h, w] = self.shape() else { unreachable!() };

        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for &v in self.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        // 常值切片 (或全 NaN) 按全黑处理.
        let span = if hi > lo { hi - lo } else { f32::INFINITY };

        let mut buf = image::GrayImage::new(w as u32, h as u32);
        for ((y, x), &pix) in self.indexed_iter() {
            let gray = if pix.is_finite() {
                (((pix - lo) / span) * 255.0) as u8
            } else {
                u8::MIN
            };
            buf.put_pixel(x as u32, y as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::ImgWriteVis;
    use ndarray::array;

    #[test]
    fn test_save_label_slice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");

        let label = array![[0u16, 7], [42, 0]];
        label.view().save_vis(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(0, 1).0, [255]);
    }

    #[test]
    fn test_save_scan_slice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");

        let scan = array![[0.0f32, 50.0], [100.0, 25.0]];
        scan.view().save_vis(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(0, 1).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [127]);
    }
}
