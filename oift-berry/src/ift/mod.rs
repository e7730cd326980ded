//! 定向图像森林变换 (Oriented Image Foresting Transform) 及其边界松弛.
//!
//! 体素为图的节点, 邻接关系给出图的边. 每个种子是一棵最优路径树的根,
//! 每个体素最终获得以最小代价到达它的那个根的标签.
//!
//! 路径代价为路径上弧权的最大值. 弧权由沿传播方向的强度变化决定,
//! 并受极性 ([`Polarity`]) 调制:
//!
//! - 极性为正时, 暗 -> 亮 的传播更便宜;
//! - 极性为负时, 亮 -> 暗 的传播更便宜;
//! - 极性为 0 时弧权对称, 退化为普通的 IFT.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::POLARITY_SCALE;

mod oift;
mod queue;
mod relax;

pub use oift::{oift, oift_with_stats, ForestStats};
pub use relax::{orelax, orelax_with_stats, RelaxStats};

/// 边界极性. 内部刻度为 `[-100, 100]` 的整数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polarity(i32);

impl Polarity {
    /// 无方向偏好的极性.
    pub const NEUTRAL: Polarity = Polarity(0);

    /// 由用户刻度 `[-1.0, 1.0]` 的极性构建. 超出范围的值被截断到边界.
    ///
    /// `pol` 为 NaN 时返回 `None`.
    pub fn from_user(pol: f32) -> Option<Self> {
        if pol.is_nan() {
            return None;
        }
        Self::from_scaled(pol * POLARITY_SCALE as f32)
    }

    /// 由内部刻度 `[-100, 100]` 的极性构建, 四舍五入到整数.
    /// 超出范围的值被截断到边界.
    ///
    /// `pol` 为 NaN 时返回 `None`.
    pub fn from_scaled(pol: f32) -> Option<Self> {
        if pol.is_nan() {
            return None;
        }
        let lim = POLARITY_SCALE as f32;
        Some(Self(pol.clamp(-lim, lim).round() as i32))
    }

    /// 内部刻度的极性值.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// 方向相反的极性.
    #[inline]
    pub const fn reversed(self) -> Self {
        Self(-self.0)
    }

    /// 沿 `from -> to` 方向传播的弧权. 两端强度必须非负.
    ///
    /// 设 `d = |to - from|`, 则:
    ///
    /// - `to > from` (暗 -> 亮): `d * (100 - pol)`;
    /// - `to < from` (亮 -> 暗): `d * (100 + pol)`;
    /// - 相等: 0.
    #[inline]
    pub fn arc_weight(self, from: i32, to: i32) -> i64 {
        let d = (to as i64 - from as i64).abs();
        let scale = POLARITY_SCALE as i64;
        match to.cmp(&from) {
            Ordering::Greater => d * (scale - self.0 as i64),
            Ordering::Less => d * (scale + self.0 as i64),
            Ordering::Equal => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Polarity;

    #[test]
    fn test_polarity_scaling() {
        assert_eq!(Polarity::from_user(0.5).unwrap().get(), 50);
        assert_eq!(Polarity::from_user(-1.0).unwrap().get(), -100);
        assert_eq!(Polarity::from_user(3.0).unwrap().get(), 100);
        assert_eq!(Polarity::from_user(-0.004).unwrap().get(), 0);
        assert_eq!(Polarity::from_scaled(33.6).unwrap().get(), 34);
        assert!(Polarity::from_user(f32::NAN).is_none());
        assert_eq!(Polarity::from_user(0.3).unwrap().reversed().get(), -30);
    }

    #[test]
    fn test_arc_weight_orientation() {
        let p = Polarity::from_scaled(50.0).unwrap();
        // 暗 -> 亮 更便宜.
        assert_eq!(p.arc_weight(10, 14), 4 * 50);
        assert_eq!(p.arc_weight(14, 10), 4 * 150);
        assert_eq!(p.arc_weight(7, 7), 0);

        let n = p.reversed();
        assert_eq!(n.arc_weight(10, 14), 4 * 150);
        assert_eq!(n.arc_weight(14, 10), 4 * 50);
    }

    #[test]
    fn test_arc_weight_neutral_symmetric() {
        let z = Polarity::NEUTRAL;
        for (a, b) in [(0, 9), (3, 1), (100, 250)] {
            assert_eq!(z.arc_weight(a, b), z.arc_weight(b, a));
            assert_eq!(z.arc_weight(a, b), 100 * (a - b).abs() as i64);
        }
        // 极端极性下单向免费.
        let full = Polarity::from_user(1.0).unwrap();
        assert_eq!(full.arc_weight(0, 9), 0);
        assert_eq!(full.arc_weight(9, 0), 9 * 200);
    }
}
