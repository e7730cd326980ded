//! 3D 邻接关系.
//!
//! 邻接关系是一组整数偏移向量. 构造后不再改变, 同一个实例会被
//! 多次图遍历反复使用. 偏移的顺序决定了等代价时的遍历顺序,
//! 因此必须是确定的.

use itertools::iproduct;

use crate::data::Dims3;

/// 偏移向量 `(dx, dy, dz)`.
pub type Offset3 = (i32, i32, i32);

const ORIGIN: Offset3 = (0, 0, 0);

/// 3D 邻接关系.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjRel3 {
    offsets: Vec<Offset3>,
}

impl AdjRel3 {
    /// 半径为 `radius` 的离散球形邻域.
    ///
    /// 在包围盒 `[-r, r]^3` 中枚举所有整数偏移, 保留欧氏距离 (以 `f32`
    /// 计算) 不大于 `radius` 的那些, 并按线性地址升序 (`dz`, `dy`, `dx`
    /// 字典序) 排列. 原点包含在内.
    ///
    /// - `radius == 0` 时只包含原点;
    /// - `radius < 0` (或 NaN) 时为空关系.
    ///
    /// 半径 1.0, 2.0^0.5, 3.0^0.5 分别对应 6-, 18-, 26-邻域.
    pub fn spheric(radius: f32) -> Self {
        if !(radius >= 0.0) {
            return Self { offsets: vec![] };
        }
        let r = radius.floor() as i32;
        // 比较距离而不是距离平方: `2.0f32.sqrt()` 的平方略小于 2.
        let offsets = iproduct!(-r..=r, -r..=r, -r..=r)
            .filter(|&(dz, dy, dx)| ((dx * dx + dy * dy + dz * dz) as f32).sqrt() <= radius)
            .map(|(dz, dy, dx)| (dx, dy, dz))
            .collect();
        Self { offsets }
    }

    /// 由给定的偏移直接创建邻接关系. 偏移顺序保持不变.
    #[inline]
    pub fn from_offsets<I: IntoIterator<Item = Offset3>>(it: I) -> Self {
        Self {
            offsets: it.into_iter().collect(),
        }
    }

    /// 偏移个数 (包括原点, 若存在).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 是否为空关系.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 按固定顺序迭代所有偏移.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Offset3> + '_ {
        self.offsets.iter().copied()
    }

    /// 反射关系: 每个偏移取反, 顺序不变.
    ///
    /// `q` 是 `p` 在 `self` 下的邻居, 当且仅当 `p` 是 `q` 在反射关系下的邻居.
    pub fn reflected(&self) -> Self {
        Self::from_offsets(self.iter().map(|(dx, dy, dz)| (-dx, -dy, -dz)))
    }

    /// 按固定顺序获取体素 `p` 在体数据 `dims` 内的所有邻居地址.
    /// 原点偏移与越界邻居会被跳过.
    #[inline]
    pub fn neighbours_of(&self, dims: Dims3, p: usize) -> impl Iterator<Item = usize> + '_ {
        let (x, y, z) = dims.coords(p);
        let (x, y, z) = (x as i64, y as i64, z as i64);
        self.offsets
            .iter()
            .filter(|&&d| d != ORIGIN)
            .filter_map(move |&(dx, dy, dz)| {
                dims.checked_address(x + dx as i64, y + dy as i64, z + dz as i64)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::AdjRel3;
    use crate::data::Dims3;

    #[test]
    fn test_spheric_sizes() {
        assert_eq!(AdjRel3::spheric(1.0).len(), 7);
        assert_eq!(AdjRel3::spheric(2.0f32.sqrt()).len(), 19);
        assert_eq!(AdjRel3::spheric(3.0f32.sqrt()).len(), 27);
        assert_eq!(AdjRel3::spheric(2.0).len(), 33);
    }

    #[test]
    fn test_spheric_degenerate() {
        let a = AdjRel3::spheric(0.0);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![(0, 0, 0)]);
        assert!(AdjRel3::spheric(-1.0).is_empty());
        assert!(AdjRel3::spheric(f32::NAN).is_empty());
        // 只有原点的关系不产生任何邻居.
        assert_eq!(a.neighbours_of(Dims3::new(3, 3, 3), 13).count(), 0);
    }

    #[test]
    fn test_spheric_order() {
        let a = AdjRel3::spheric(1.0);
        assert_eq!(
            a.iter().collect::<Vec<_>>(),
            vec![
                (0, 0, -1),
                (0, -1, 0),
                (-1, 0, 0),
                (0, 0, 0),
                (1, 0, 0),
                (0, 1, 0),
                (0, 0, 1),
            ]
        );
        // 每次构造结果一致.
        assert_eq!(a, AdjRel3::spheric(1.0));
    }

    #[test]
    fn test_neighbours_of_clips_border() {
        let d = Dims3::new(3, 3, 3);
        let a = AdjRel3::spheric(1.0);
        // 角点只有 3 个 6-邻居.
        assert_eq!(a.neighbours_of(d, 0).collect::<Vec<_>>(), vec![1, 3, 9]);
        // 中心有 6 个, 且按地址升序.
        assert_eq!(
            a.neighbours_of(d, 13).collect::<Vec<_>>(),
            vec![4, 10, 12, 14, 16, 22]
        );
    }

    #[test]
    fn test_reflected() {
        let a = AdjRel3::from_offsets([(1, 0, 0), (0, 2, -1)]);
        assert_eq!(
            a.reflected().iter().collect::<Vec<_>>(),
            vec![(-1, 0, 0), (0, -2, 1)]
        );
    }
}
