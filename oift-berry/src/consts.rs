//! 通用常量.

/// 标签值.
pub mod label {
    /// 未标注体素的哨兵值. 种子无法到达的体素会一直保持该值.
    pub const NIL: i32 = -1;

    /// 背景标签.
    pub const BACKGROUND: i32 = 0;

    /// 目标 (object) 标签. 条件膨胀只会扩张该标签.
    pub const OBJECT: i32 = 1;

    /// 体素是否未被标注?
    #[inline]
    pub const fn is_nil(l: i32) -> bool {
        l == NIL
    }

    /// 体素是否是目标?
    #[inline]
    pub const fn is_object(l: i32) -> bool {
        l == OBJECT
    }

    /// 体素是否已经被某个种子征服?
    #[inline]
    pub const fn is_labeled(l: i32) -> bool {
        !is_nil(l)
    }
}

/// OIFT 与 ORelax 使用的球形邻接半径 (即 6-邻域).
pub const FOREST_RADIUS: f32 = 1.0;

/// 条件膨胀使用的球形邻接半径.
pub const DILATION_RADIUS: f32 = 1.0;

/// 内部极性刻度的绝对值上限. 用户输入 `[-1.0, 1.0]` 会被放大到
/// `[-POLARITY_SCALE, POLARITY_SCALE]`.
pub const POLARITY_SCALE: i32 = 100;

/// 默认边界极性 (用户刻度).
pub const DEFAULT_POLARITY: f32 = 0.5;

/// 默认松弛迭代次数.
pub const DEFAULT_RELAX_ITERATIONS: u32 = 50;

/// 默认条件膨胀百分位.
pub const DEFAULT_PERCENTILE: u8 = 50;
