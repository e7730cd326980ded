//! 完整的分割流程: OIFT -> ORelax -> 条件膨胀.

use std::fmt;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjRel3;
use crate::consts::{
    DEFAULT_PERCENTILE, DEFAULT_POLARITY, DEFAULT_RELAX_ITERATIONS, DILATION_RADIUS,
    FOREST_RADIUS,
};
use crate::data::{LabelMap, Scene};
use crate::ift::{oift_with_stats, orelax_with_stats, Polarity};
use crate::post_proc::Dilated;
use crate::seeds::SeedSet;

/// 分割参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentParams {
    /// 边界极性.
    pub polarity: Polarity,

    /// 边界松弛的轮数.
    pub relax_iterations: u32,

    /// 条件膨胀的百分位, 取值 `[0, 100]`.
    pub percentile: u8,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            // 常量不是 NaN, 该操作不会生成 `None`, 可直接 unwrap.
            polarity: Polarity::from_user(DEFAULT_POLARITY).unwrap(),
            relax_iterations: DEFAULT_RELAX_ITERATIONS,
            percentile: DEFAULT_PERCENTILE,
        }
    }
}

impl SegmentParams {
    /// 由用户刻度的参数构建.
    ///
    /// `polarity` 超出 `[-1.0, 1.0]` 时被截断; 为 NaN 或 `percentile > 100`
    /// 时返回 `Err`.
    pub fn new(polarity: f32, relax_iterations: u32, percentile: u8) -> Result<Self, ParamsError> {
        let polarity = Polarity::from_user(polarity).ok_or(ParamsError::NanPolarity)?;
        if percentile > 100 {
            return Err(ParamsError::Percentile(percentile));
        }
        Ok(Self {
            polarity,
            relax_iterations,
            percentile,
        })
    }
}

/// 非法的分割参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamsError {
    /// 极性为 NaN.
    NanPolarity,

    /// 百分位超过 100.
    Percentile(u8),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::NanPolarity => write!(f, "polarity is not a number"),
            ParamsError::Percentile(p) => write!(f, "percentile {p} is not in [0, 100]"),
        }
    }
}

impl std::error::Error for ParamsError {}

/// 一次分割各阶段的统计.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentReport {
    /// 去重后的种子 (根) 个数.
    pub seeds: usize,

    /// 任何种子都无法到达的体素个数.
    pub unreached: usize,

    /// OIFT 之后的目标体素个数.
    pub forest_object: usize,

    /// ORelax 之后的目标体素个数.
    pub relaxed_object: usize,

    /// 条件膨胀新增的目标体素个数.
    pub dilated_added: usize,

    /// 最终的目标体素个数.
    pub final_object: usize,
}

/// 对 `scene` 执行完整的分割流程, 返回标签图.
///
/// # 注意
///
/// `scene` 的强度必须非负 (见 [`Scene::normalize_non_negative`]).
#[inline]
pub fn segment(scene: &Scene, seeds: &SeedSet, params: &SegmentParams) -> LabelMap {
    segment_with_report(scene, seeds, params).0
}

/// 同 [`segment`], 但同时返回各阶段的统计.
pub fn segment_with_report(
    scene: &Scene,
    seeds: &SeedSet,
    params: &SegmentParams,
) -> (LabelMap, SegmentReport) {
    let adj = AdjRel3::spheric(FOREST_RADIUS);
    let mut report = SegmentReport::default();

    let since = Instant::now();
    let (label, stats) = oift_with_stats(
        &adj,
        scene,
        params.polarity,
        seeds,
        seeds.initial_labels(scene),
    );
    report.seeds = stats.roots;
    report.unreached = stats.unreached;
    report.forest_object = label.count_object();
    log::info!(
        "oift: {} object voxels in {} ms",
        report.forest_object,
        since.elapsed().as_millis()
    );

    let since = Instant::now();
    let (label, stats) = orelax_with_stats(
        &adj,
        scene,
        params.polarity,
        seeds,
        label,
        params.relax_iterations,
    );
    report.relaxed_object = label.count_object();
    log::info!(
        "orelax: {} rounds, {} object voxels in {} ms",
        stats.rounds,
        report.relaxed_object,
        since.elapsed().as_millis()
    );

    let since = Instant::now();
    let Dilated { label, added } = dilate(scene, label, params.percentile);
    report.dilated_added = added;
    report.final_object = label.count_object();
    log::info!(
        "dilation: {added} voxels added, {} object voxels in {} ms",
        report.final_object,
        since.elapsed().as_millis()
    );

    (label, report)
}

fn dilate(scene: &Scene, label: LabelMap, percentile: u8) -> Dilated {
    let adj = AdjRel3::spheric(DILATION_RADIUS);
    #[cfg(feature = "rayon")]
    let dilated = crate::post_proc::par_dilation_conditional(&adj, scene, label, percentile);
    #[cfg(not(feature = "rayon"))]
    let dilated = crate::post_proc::dilation_conditional(&adj, scene, label, percentile);
    dilated
}
