//! 训练/验证尾部划分.
//!
//! 划分规则固定: 验证集取序列尾部 `n_val = max(1, round(fraction * len))`
//! 个元素, 剩余前缀为训练集. 两个区间无交无隙, 拼接后恰好覆盖原序列.

use std::ops::Range;

/// 一次尾部划分的结果: 训练前缀与验证后缀两个索引区间.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValSplit {
    /// 训练集索引区间 (前缀). 可能为空.
    pub train: Range<usize>,

    /// 验证集索引区间 (尾部). 永不为空.
    pub val: Range<usize>,
}

impl TrainValSplit {
    /// 训练集元素个数.
    #[inline]
    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    /// 验证集元素个数.
    #[inline]
    pub fn n_val(&self) -> usize {
        self.val.len()
    }

    /// 按划分把 `items` 克隆成 (训练, 验证) 两个序列, 保持原顺序.
    ///
    /// `items` 的长度必须等于划分覆盖的总长度, 否则程序 panic.
    pub fn partition<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        assert_eq!(items.len(), self.val.end, "序列长度与划分不一致");
        (
            items[self.train.clone()].to_vec(),
            items[self.val.clone()].to_vec(),
        )
    }
}

/// 对长度为 `len` 的有序索引序列做尾部划分. 纯函数, 无副作用.
///
/// # 注意
///
/// 1. `len >= 1`, 否则程序 panic.
/// 2. `fraction` 必须落在 (0, 1] 内, 否则程序 panic.
/// 3. `len == 1` 时验证集取走唯一元素, 训练集为空.
pub fn split_trailing(len: usize, fraction: f64) -> TrainValSplit {
    assert!(len >= 1, "空序列无法划分");
    assert!(
        0.0 < fraction && fraction <= 1.0,
        "验证集比例必须落在 (0, 1] 内"
    );

    let n_val = ((fraction * len as f64).round() as usize).clamp(1, len);
    TrainValSplit {
        train: 0..len - n_val,
        val: len - n_val..len,
    }
}

#[cfg(test)]
mod tests {
    use super::{split_trailing, TrainValSplit};

    /// L=10, f=0.8 → n_val=8, 训练 2, 验证 8.
    #[test]
    fn test_split_generic() {
        let s = split_trailing(10, 0.8);
        assert_eq!(
            s,
            TrainValSplit {
                train: 0..2,
                val: 2..10,
            }
        );
        assert_eq!(s.n_train(), 2);
        assert_eq!(s.n_val(), 8);
    }

    /// L=1 时验证集取走唯一元素.
    #[test]
    fn test_split_single() {
        let s = split_trailing(1, 0.8);
        assert_eq!(s.n_train(), 0);
        assert_eq!(s.val, 0..1);
    }

    /// n_val 下界为 1: 比例很小时验证集仍非空.
    #[test]
    fn test_split_min_val() {
        let s = split_trailing(100, 0.001);
        assert_eq!(s.n_val(), 1);
        assert_eq!(s.n_train(), 99);
    }

    /// f=1 时验证集取走整个序列.
    #[test]
    fn test_split_full_val() {
        let s = split_trailing(5, 1.0);
        assert_eq!(s.n_train(), 0);
        assert_eq!(s.n_val(), 5);
    }

    /// 拼接性质: train ++ val 恰好还原原序列.
    #[test]
    fn test_split_concat_property() {
        for len in 1usize..40 {
            for f in [0.1, 0.25, 0.5, 0.8, 0.99, 1.0] {
                let s = split_trailing(len, f);
                let items: Vec<usize> = (0..len).collect();
                let (train, val) = s.partition(&items);
                assert!(!val.is_empty());
                assert_eq!(train.len() + val.len(), len);
                let joined: Vec<usize> = train.into_iter().chain(val).collect();
                assert_eq!(joined, items);
            }
        }
    }

    #[test]
    #[should_panic(expected = "空序列")]
    fn test_split_empty() {
        let _ = split_trailing(0, 0.8);
    }

    #[test]
    #[should_panic(expected = "(0, 1]")]
    fn test_split_bad_fraction() {
        let _ = split_trailing(10, 0.0);
    }

    #[test]
    #[should_panic(expected = "长度与划分不一致")]
    fn test_partition_len_mismatch() {
        let s = split_trailing(3, 0.5);
        let _ = s.partition(&[1, 2]);
    }
}
