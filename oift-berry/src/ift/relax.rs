//! 定向森林的边界松弛 (ORelax).
//!
//! 每一轮包括三步:
//!
//! 1. 平滑投票: 对每个边界体素 (非种子, 且邻域中存在其它标签), 每个邻居以
//!   "沿 邻居 -> 该体素 方向传播的弧权越低, 支持越强" 的权重支持自己的标签,
//!   取支持度最高者. 所有体素基于上一轮的标签同时投票 (Jacobi 式),
//!   因此结果与遍历顺序无关.
//! 2. 分区代价: 从种子出发, 每个标签只在与自己同标签的体素中传播, 得到每个
//!   体素在当前标签下的最优路径代价. 与种子失去同标签连通性的 "孤立" 体素
//!   代价为无穷.
//! 3. 局部竞争: 边界带 (边界体素及其邻居) 与孤立体素重新开放, 带外一圈体素
//!   连同带内体素以各自的代价入队, 再做一次定向的竞争. 只有其它标签以
//!   严格更低的代价到达时, 体素才会改变标签.
//!
//! 轮数固定为 `niter`, 不做收敛检测.

use super::oift::OiftImp;
use super::Polarity;
use crate::adjacency::AdjRel3;
use crate::consts::label::*;
use crate::consts::POLARITY_SCALE;
use crate::data::{Dims3, Grid3d, LabelMap, Scene};
use crate::seeds::SeedSet;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 边界松弛的统计信息.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RelaxStats {
    /// 实际执行的轮数.
    pub rounds: u32,

    /// 所有轮次中因投票而改变标签的体素总数.
    pub flipped: usize,

    /// 所有轮次中在局部竞争里改变标签的体素总数.
    pub reconquered: usize,
}

/// 对 `label` 做 `niter` 轮边界松弛并返回.
///
/// 种子标签会按 [`SeedSet::roots`] 重新写入, 种子体素本身永远不会改变.
/// [`NIL`] 体素不参与松弛.
///
/// # 注意
///
/// - `scene` 的强度必须非负;
/// - `scene` 和 `label` 的形状必须一致, 否则程序 panic.
#[inline]
pub fn orelax(
    adj: &AdjRel3,
    scene: &Scene,
    polarity: Polarity,
    seeds: &SeedSet,
    label: LabelMap,
    niter: u32,
) -> LabelMap {
    orelax_with_stats(adj, scene, polarity, seeds, label, niter).0
}

/// 同 [`orelax`], 但同时返回统计信息.
pub fn orelax_with_stats(
    adj: &AdjRel3,
    scene: &Scene,
    polarity: Polarity,
    seeds: &SeedSet,
    mut label: LabelMap,
    niter: u32,
) -> (LabelMap, RelaxStats) {
    assert_eq!(scene.dims(), label.dims(), "场景和标签图形状不一致");

    let mut stats = RelaxStats::default();
    if seeds.is_empty() {
        return (label, stats);
    }

    let mut imp = RelaxImp::new(adj, scene, polarity, seeds);
    let labels = label.as_slice_mut();
    for &(p, l) in imp.roots.iter() {
        labels[p] = l;
    }

    for round in 0..niter {
        let flipped = imp.vote(labels);
        imp.partition_costs(labels);
        let reconquered = imp.compete(labels);
        log::debug!("orelax round {round}: {flipped} flipped, {reconquered} reconquered");
        stats.rounds += 1;
        stats.flipped += flipped;
        stats.reconquered += reconquered;
    }

    (label, stats)
}

/// `orelax` 的实现细节.
struct RelaxImp<'a> {
    adj: &'a AdjRel3,
    dims: Dims3,
    intensity: &'a [i32],
    polarity: Polarity,
    /// 投票权重上限, 大于任何弧权. 任何权重都至少为 1.
    weight_top: i64,
    roots: Vec<(usize, i32)>,
    is_seed: Vec<bool>,
    /// 本轮竞争前的标签.
    prev: Vec<i32>,
    /// 当前标签下的最优路径代价.
    cost: Vec<i64>,
    forest: OiftImp<'a>,
}

impl<'a> RelaxImp<'a> {
    fn new(adj: &'a AdjRel3, scene: &'a Scene, polarity: Polarity, seeds: &SeedSet) -> Self {
        let n = scene.len();
        let range = scene.max_value() as i64 - scene.min_value() as i64;
        Self {
            adj,
            dims: scene.dims(),
            intensity: scene.as_slice(),
            polarity,
            weight_top: range * 2 * POLARITY_SCALE as i64 + 1,
            roots: seeds.roots(),
            is_seed: seeds.mask(n),
            prev: vec![NIL; n],
            cost: vec![i64::MAX; n],
            forest: OiftImp::new(adj, scene, polarity),
        }
    }

    /// `p` 是否为可变的边界体素: 非种子, 已标记, 且邻域中存在其它标签.
    fn is_boundary(&self, labels: &[i32], p: usize) -> bool {
        let lp = labels[p];
        !self.is_seed[p]
            && is_labeled(lp)
            && self
                .adj
                .neighbours_of(self.dims, p)
                .any(|q| is_labeled(labels[q]) && labels[q] != lp)
    }

    /// 所有边界体素同时投票, 应用结果. 返回改变标签的体素个数.
    fn vote(&self, labels: &mut [i32]) -> usize {
        let changes = self.collect_votes(labels);
        for &(p, l) in changes.iter() {
            labels[p] = l;
        }
        changes.len()
    }

    #[cfg(feature = "rayon")]
    fn collect_votes(&self, labels: &[i32]) -> Vec<(usize, i32)> {
        (0..labels.len())
            .into_par_iter()
            .filter_map(|p| self.vote_at(labels, p).map(|l| (p, l)))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn collect_votes(&self, labels: &[i32]) -> Vec<(usize, i32)> {
        (0..labels.len())
            .filter_map(|p| self.vote_at(labels, p).map(|l| (p, l)))
            .collect()
    }

    /// 体素 `p` 的投票结果. 仅当标签需要改变时返回 `Some`.
    fn vote_at(&self, labels: &[i32], p: usize) -> Option<i32> {
        if !self.is_boundary(labels, p) {
            return None;
        }
        let lp = labels[p];
        let ip = self.intensity[p];
        // 首项为自身标签, 并列时保持不变.
        let mut support: Vec<(i32, i64)> = Vec::with_capacity(4);
        support.push((lp, self.weight_top));
        for q in self.adj.neighbours_of(self.dims, p) {
            let lq = labels[q];
            if is_nil(lq) {
                continue;
            }
            let w = self.weight_top - self.polarity.arc_weight(self.intensity[q], ip);
            match support.iter_mut().find(|(l, _)| *l == lq) {
                Some(entry) => entry.1 += w,
                None => support.push((lq, w)),
            }
        }

        let best = support
            .iter()
            .copied()
            .fold(support[0], |acc, e| if e.1 > acc.1 { e } else { acc });
        (best.0 != lp).then_some(best.0)
    }

    /// 从种子出发, 每个标签只在同标签体素中传播, 将代价写入 `self.cost`.
    fn partition_costs(&mut self, labels: &mut [i32]) {
        self.prev.copy_from_slice(labels);
        self.forest.reset();
        for &(p, _) in self.roots.iter() {
            self.forest.push_root(p);
        }
        let prev = &self.prev;
        // 只在同标签之间传播, 标签不会被改写.
        self.forest.run(labels, |p, q| prev[q] == prev[p]);
        self.cost.copy_from_slice(self.forest.costs());
    }

    /// 标记本轮开放的体素: 边界带 (边界体素及其非种子邻居) 与孤立体素.
    fn open_mask(&self, labels: &[i32]) -> Vec<bool> {
        let boundary = self.boundary_mask(labels);
        let mut open = vec![false; labels.len()];
        for p in 0..labels.len() {
            if self.is_seed[p] || is_nil(labels[p]) {
                continue;
            }
            open[p] = boundary[p]
                || self.cost[p] == i64::MAX
                || self.adj.neighbours_of(self.dims, p).any(|q| boundary[q]);
        }
        open
    }

    #[cfg(feature = "rayon")]
    fn boundary_mask(&self, labels: &[i32]) -> Vec<bool> {
        (0..labels.len())
            .into_par_iter()
            .map(|p| self.is_boundary(labels, p))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn boundary_mask(&self, labels: &[i32]) -> Vec<bool> {
        (0..labels.len())
            .map(|p| self.is_boundary(labels, p))
            .collect()
    }

    /// 在开放体素上重新竞争. 返回改变标签的体素个数.
    ///
    /// 开放体素以及与之相邻的已到达体素按地址升序, 以 `self.cost` 入队.
    /// 未被任何标签到达的孤立体素保持原标签.
    fn compete(&mut self, labels: &mut [i32]) -> usize {
        let open = self.open_mask(labels);
        self.forest.reset();
        for p in 0..labels.len() {
            let c = self.cost[p];
            if c == i64::MAX || is_nil(labels[p]) {
                continue;
            }
            if open[p] || self.adj.neighbours_of(self.dims, p).any(|q| open[q]) {
                self.forest.push_with_cost(p, c);
            }
        }
        self.forest.run(labels, |_, q| open[q]);

        labels
            .iter()
            .zip(self.prev.iter())
            .filter(|(now, old)| now != old)
            .count()
    }
}
