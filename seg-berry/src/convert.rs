//! 3D → 2D 切片展平与名字簿记.
//!
//! 训练后端只消费 2D 图像, 因此 3D 体数据在进入训练前先沿 z
//! 轴展平成有序的 2D 切片序列. 展平 **保序**: 先体数据序,
//! 再切片序. 若给定源文件标识, 则同时派生
//! `{source_stem}_{slice_index}` 形式的逐切片标识符, 与切片一一对齐.

use itertools::Itertools;
use ndarray::{Array2, Array3, Axis};
use num::{NumCast, ToPrimitive};
use std::path::{Path, PathBuf};

/// 展平结果: 有序 2D 切片序列, 以及可选的平行标识符序列.
#[derive(Debug, Clone)]
pub struct SliceStack<T> {
    /// 2D 切片, 先体数据序, 再切片序.
    pub slices: Vec<Array2<T>>,

    /// 逐切片标识符, 与 `slices` 一一对齐. 仅当输入给定源标识时存在.
    pub names: Option<Vec<String>>,
}

impl<T> SliceStack<T> {
    /// 切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// 派生第 `index` 张切片的标识符.
#[inline]
fn slice_name(source: &Path, index: usize) -> String {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_{index}")
}

/// 将 `volume` 的每张水平切片转换成目标体素类型.
///
/// 如果存在无法转换的体素值 (如转换到整数类型的 NaN), 则程序 panic.
fn cast_slices<A, B>(volume: &Array3<A>, out: &mut Vec<Array2<B>>)
where
    A: ToPrimitive + Copy,
    B: NumCast,
{
    for plane in volume.axis_iter(Axis(0)) {
        out.push(plane.map(|v| B::from(*v).expect("体素值无法转换到目标类型")));
    }
}

/// 将有序 3D 体数据序列沿 z 轴展平为有序 2D 切片序列, 并转换到目标体素类型.
///
/// `names` 若给定, 必须与 `volumes` 平行 (个数一致, 否则程序 panic),
/// 此时结果会携带派生的逐切片标识符.
///
/// 假设输入是良构的同构 3D 数据, 没有错误路径.
pub fn flatten_volumes<A, B>(volumes: &[Array3<A>], names: Option<&[PathBuf]>) -> SliceStack<B>
where
    A: ToPrimitive + Copy,
    B: NumCast,
{
    if let Some(names) = names {
        assert_eq!(volumes.len(), names.len(), "体数据与标识个数不一致");
    }

    let mut slices = Vec::new();
    let mut out_names = names.map(|_| Vec::new());

    for (i, volume) in volumes.iter().enumerate() {
        let n = volume.len_of(Axis(0));
        cast_slices(volume, &mut slices);
        if let (Some(out), Some(names)) = (out_names.as_mut(), names) {
            out.extend((0..n).map(|j| slice_name(&names[i], j)));
        }
    }

    SliceStack {
        slices,
        names: out_names,
    }
}

/// 以锁步方式展平 (图像, 标注) 体数据对.
///
/// 两个序列必须平行: 体数据个数一致, 并且 **每对** 体数据的切片数一致
/// (逐对校验, 错位输入在这里直接失败, 而不是静默错配).
/// 若给定 `names`, 两侧结果携带相同的派生标识符.
pub fn flatten_paired<A, B, C, D>(
    scans: &[Array3<A>],
    labels: &[Array3<C>],
    names: Option<&[PathBuf]>,
) -> (SliceStack<B>, SliceStack<D>)
where
    A: ToPrimitive + Copy,
    B: NumCast,
    C: ToPrimitive + Copy,
    D: NumCast,
{
    assert_eq!(scans.len(), labels.len(), "图像与标注体数据个数不一致");
    for (i, (scan, label)) in scans.iter().zip_eq(labels).enumerate() {
        assert_eq!(
            scan.len_of(Axis(0)),
            label.len_of(Axis(0)),
            "第 {i} 对体数据的切片数不一致"
        );
    }

    let xs = flatten_volumes(scans, names);
    let mut ys: SliceStack<D> = flatten_volumes(labels, None);
    ys.names = xs.names.clone();

    // 原始脚本的聚合校验. 逐对校验通过后该条件必然成立.
    assert_eq!(xs.len(), ys.len());

    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::{flatten_paired, flatten_volumes, SliceStack};
    use ndarray::{Array3, Axis};
    use std::path::PathBuf;

    fn volume(z: usize, fill: f32) -> Array3<f32> {
        Array3::from_shape_fn((z, 2, 2), |(k, h, w)| fill + (k * 4 + h * 2 + w) as f32)
    }

    /// 单个体数据: 恰好 n 张切片, 逐张等于 `V[i]`, 按索引序.
    #[test]
    fn test_flatten_single_volume() {
        let v = volume(3, 0.0);
        let stack: SliceStack<f32> = flatten_volumes(&[v.clone()], None);
        assert_eq!(stack.len(), 3);
        assert!(stack.names.is_none());
        for (i, slice) in stack.slices.iter().enumerate() {
            assert_eq!(slice, &v.index_axis(Axis(0), i));
        }
    }

    /// 目标类型转换: f32 体数据展平为 u16 切片.
    #[test]
    fn test_flatten_casts() {
        let v = volume(2, 0.0);
        let stack: SliceStack<u16> = flatten_volumes(&[v], None);
        assert_eq!(stack.slices[0][(0, 1)], 1u16);
        assert_eq!(stack.slices[1][(1, 1)], 7u16);
    }

    /// 标识符派生: `{stem}_{index}`, 与切片逐位对齐.
    #[test]
    fn test_flatten_names() {
        let vs = [volume(2, 0.0), volume(3, 100.0)];
        let names = [PathBuf::from("/data/c1.tif"), PathBuf::from("/data/c4.tif")];
        let stack: SliceStack<f32> = flatten_volumes(&vs, Some(&names));
        assert_eq!(
            stack.names.as_deref().unwrap(),
            ["c1_0", "c1_1", "c4_0", "c4_1", "c4_2"]
        );
        assert_eq!(stack.len(), 5);
    }

    /// 成对展平: 两侧等长, 标识符共享.
    #[test]
    fn test_flatten_paired() {
        let scans = [volume(2, 0.0)];
        let labels = [Array3::<u16>::zeros((2, 2, 2))];
        let names = [PathBuf::from("v0.tif")];
        let (xs, ys): (SliceStack<f32>, SliceStack<u16>) =
            flatten_paired(&scans, &labels, Some(&names));
        assert_eq!(xs.len(), ys.len());
        assert_eq!(xs.names, ys.names);
        assert_eq!(xs.names.as_deref().unwrap(), ["v0_0", "v0_1"]);
    }

    /// 某对体数据切片数错位必须直接失败, 而不是静默错配.
    #[test]
    #[should_panic(expected = "切片数不一致")]
    fn test_flatten_paired_depth_mismatch() {
        let scans = [volume(2, 0.0), volume(3, 0.0)];
        let labels = [Array3::<u16>::zeros((2, 2, 2)), Array3::<u16>::zeros((2, 2, 2))];
        let _ = flatten_paired::<_, f32, _, u16>(&scans, &labels, None);
    }

    #[test]
    #[should_panic(expected = "体数据个数不一致")]
    fn test_flatten_paired_count_mismatch() {
        let scans = [volume(2, 0.0)];
        let labels: [Array3<u16>; 0] = [];
        let _ = flatten_paired::<_, f32, _, u16>(&scans, &labels, None);
    }
}
