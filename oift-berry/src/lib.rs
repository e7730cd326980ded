#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供基于种子点的 3D 体数据分割: 定向图像森林变换 (OIFT),
//! 边界松弛 (ORelax) 和以强度百分位为门限的条件膨胀.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 目前只支持二分类 (目标 / 背景) 的 3D 分割, 不支持 2D 图像.
//! 2. 所有算法都假设强度非负. 读取的场景请先调用
//!   [`Scene::normalize_non_negative`].
//! 3. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### 体数据与寻址 ✅
//!
//! 线性地址 `p = x + y * nx + z * nx * ny`, nii 读写.
//!
//! 实现位于 `oift-berry/src/data`.
//!
//! ### 球形邻接关系 ✅
//!
//! 实现位于 `oift-berry/src/adjacency.rs`.
//!
//! ### 种子点文件读取 ✅
//!
//! 实现位于 `oift-berry/src/seeds.rs`.
//!
//! ### OIFT 与 ORelax ✅
//!
//! 最大弧权路径代价, 先进先出的等代价出队顺序. 松弛阶段的投票借助 `rayon` 并行,
//! 结果与线程数无关.
//!
//! 实现位于 `oift-berry/src/ift`.
//!
//! ### 条件膨胀 ✅
//!
//! 实现位于 `oift-berry/src/post_proc`.
//!
//! ### 高斯平滑 ✅
//!
//! 实现位于 `oift-berry/src/filter.rs`.
//!
//! ### 更多极性刻度 ⌛️
//!
//! 目前极性在内部取整到 `[-100, 100]`. 更细的刻度需要将弧权改为定点数.

/// 三维索引 `(x, y, z)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

/// 3D 体数据基础数据结构.
mod data;

pub use data::{Dims3, Grid3d, LabelMap, Scene, VolumeError};

pub mod adjacency;

pub mod seeds;

pub mod filter;

pub mod ift;

pub mod post_proc;

pub mod pipeline;

pub mod prelude;
