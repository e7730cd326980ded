use super::queue::Frontier;
use super::Polarity;
use crate::adjacency::AdjRel3;
use crate::consts::label::*;
use crate::data::{Dims3, Grid3d, LabelMap, Scene};
use crate::seeds::SeedSet;

/// 一次森林计算的统计信息.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ForestStats {
    /// 去重后的根个数.
    pub roots: usize,

    /// 被征服 (含根) 的体素个数.
    pub settled: usize,

    /// 任何根都无法到达的体素个数. 这些体素保持 [`NIL`].
    pub unreached: usize,
}

/// 以种子为根计算定向最优路径森林, 返回标签图.
///
/// `label` 应除种子外全部为 [`NIL`]; 种子标签会按 [`SeedSet::roots`]
/// 重新写入. 被征服的体素获得其根的标签, 无法到达的体素保持原值.
///
/// 没有种子时, 返回的标签图与输入相同 (通常全为 [`NIL`]).
///
/// # 注意
///
/// - `scene` 的强度必须非负;
/// - `scene` 和 `label` 的形状必须一致, 否则程序 panic.
#[inline]
pub fn oift(
    adj: &AdjRel3,
    scene: &Scene,
    polarity: Polarity,
    seeds: &SeedSet,
    label: LabelMap,
) -> LabelMap {
    oift_with_stats(adj, scene, polarity, seeds, label).0
}

/// 同 [`oift`], 但同时返回统计信息.
pub fn oift_with_stats(
    adj: &AdjRel3,
    scene: &Scene,
    polarity: Polarity,
    seeds: &SeedSet,
    mut label: LabelMap,
) -> (LabelMap, ForestStats) {
    assert_eq!(scene.dims(), label.dims(), "场景和标签图形状不一致");

    let roots = seeds.roots();
    if roots.is_empty() {
        log::warn!("no valid seeds: every voxel stays unlabeled");
        let stats = ForestStats {
            unreached: label.len(),
            ..Default::default()
        };
        return (label, stats);
    }

    let mut imp = OiftImp::new(adj, scene, polarity);
    let labels = label.as_slice_mut();
    for &(p, l) in roots.iter() {
        labels[p] = l;
        imp.push_root(p);
    }
    let settled = imp.run(labels, |_, _| true);

    let stats = ForestStats {
        roots: roots.len(),
        settled,
        unreached: scene.len() - settled,
    };
    log::debug!(
        "oift: {} roots, {} settled, {} unreached",
        stats.roots,
        stats.settled,
        stats.unreached
    );
    (label, stats)
}

/// 竞争式最优路径森林的实现细节. 可在多次局部计算之间复用.
pub(crate) struct OiftImp<'a> {
    adj: &'a AdjRel3,
    dims: Dims3,
    intensity: &'a [i32],
    polarity: Polarity,
    cost: Vec<i64>,
    done: Vec<bool>,
    touched: Vec<usize>,
    frontier: Frontier,
}

impl<'a> OiftImp<'a> {
    pub fn new(adj: &'a AdjRel3, scene: &'a Scene, polarity: Polarity) -> Self {
        let n = scene.len();
        Self {
            adj,
            dims: scene.dims(),
            intensity: scene.as_slice(),
            polarity,
            cost: vec![i64::MAX; n],
            done: vec![false; n],
            touched: Vec::with_capacity(64),
            frontier: Frontier::new(),
        }
    }

    /// 将 `p` 作为代价为 0 的根. 其标签必须已经写好.
    #[inline]
    pub fn push_root(&mut self, p: usize) {
        self.push_with_cost(p, 0);
    }

    /// 将 `p` 以已知的路径代价 `c` 加入队列. 其标签必须已经写好.
    ///
    /// 其它标签只有以严格更低的代价到达 `p` 时才能夺走它.
    #[inline]
    pub fn push_with_cost(&mut self, p: usize, c: i64) {
        if self.cost[p] == i64::MAX {
            self.touched.push(p);
        }
        self.cost[p] = c;
        self.frontier.push(c, p);
    }

    /// 各体素当前的路径代价, 未到达的为 `i64::MAX`.
    #[inline]
    pub fn costs(&self) -> &[i64] {
        &self.cost
    }

    /// 运行竞争直至队列为空. 只有 `open(p, q)` 成立时 `p` 才能征服邻居 `q`.
    ///
    /// 返回本次出队定型的体素个数.
    pub fn run<F: Fn(usize, usize) -> bool>(&mut self, labels: &mut [i32], open: F) -> usize {
        let adj = self.adj;
        let mut settled = 0usize;

        while let Some((c, p)) = self.frontier.pop() {
            // 过期条目
            if self.done[p] || c != self.cost[p] {
                continue;
            }
            self.done[p] = true;
            settled += 1;

            let (ip, lp) = (self.intensity[p], labels[p]);
            for q in adj.neighbours_of(self.dims, p) {
                if self.done[q] || !open(p, q) {
                    continue;
                }
                let tmp = c.max(self.polarity.arc_weight(ip, self.intensity[q]));
                if tmp < self.cost[q] {
                    if self.cost[q] == i64::MAX {
                        self.touched.push(q);
                    }
                    self.cost[q] = tmp;
                    labels[q] = lp;
                    self.frontier.push(tmp, q);
                }
            }
        }

        settled
    }

    /// 恢复到刚创建时的状态, 只清理被访问过的体素.
    pub fn reset(&mut self) {
        for p in self.touched.drain(..) {
            self.cost[p] = i64::MAX;
            self.done[p] = false;
        }
        self.frontier.clear();
    }
}
