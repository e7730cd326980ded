//! 以强度百分位为门限的条件膨胀.
//!
//! 目标 (假设为较暗的一方) 向外扩张一层, 但只接受外边界中较暗的那一部分体素.

use crate::adjacency::AdjRel3;
use crate::consts::label::*;
use crate::data::{Grid3d, LabelMap, Scene};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// 目标的外边界: 不属于目标, 但与某个目标体素相邻的体素.
///
/// 边界体素按地址升序排列. 百分位排序的并列顺序依赖于此.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DilationBorder {
    marked: Vec<bool>,
    order: Vec<usize>,
}

impl DilationBorder {
    fn from_mask(marked: Vec<bool>) -> Self {
        let order = marked
            .iter()
            .enumerate()
            .filter_map(|(p, m)| m.then_some(p))
            .collect();
        Self { marked, order }
    }

    /// 边界体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 边界是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 体素 `p` 是否在边界中.
    #[inline]
    pub fn contains(&self, p: usize) -> bool {
        self.marked.get(p).copied().unwrap_or(false)
    }

    /// 按地址升序迭代边界体素.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.order.iter().copied()
    }
}

/// 提取 `label` 中目标在邻接关系 `adj` 下的外边界.
///
/// 除 [`OBJECT`] 以外的任何标签 (包括 [`NIL`]) 都视为非目标.
pub fn dilation_border(adj: &AdjRel3, label: &LabelMap) -> DilationBorder {
    let dims = label.dims();
    let labels = label.as_slice();
    let mut marked = vec![false; labels.len()];

    for p in (0..labels.len()).filter(|&p| is_object(labels[p])) {
        for q in adj.neighbours_of(dims, p) {
            if !is_object(labels[q]) {
                marked[q] = true;
            }
        }
    }
    DilationBorder::from_mask(marked)
}

/// 按强度百分位筛选边界: 只保留较暗的一部分, 返回被移除的体素个数.
///
/// 边界体素按强度升序稳定排序 (并列时保持地址顺序), 截断位置为
/// `floor(percentile / 100 * (count - 1))`, 排名大于截断位置的体素被移除.
/// 因此 `percentile == 0` 时恰好保留最暗的一个体素, `percentile >= 100` 时
/// 全部保留. 空边界不做任何事.
///
/// # 注意
///
/// `scene` 与生成 `border` 的标签图形状必须一致, 否则程序可能 panic.
pub fn condition_percentile(border: &mut DilationBorder, scene: &Scene, percentile: u8) -> usize {
    if border.is_empty() {
        return 0;
    }
    let intensity = scene.as_slice();
    let mut ranked = border.order.clone();
    // `sort_by_key` 是稳定排序.
    ranked.sort_by_key(|&p| intensity[p]);

    let percentile = percentile.min(100) as f64;
    let cutoff = (percentile / 100.0 * (ranked.len() - 1) as f64).floor() as usize;
    let removed = &ranked[cutoff + 1..];
    for &p in removed {
        border.marked[p] = false;
    }
    let marked = &border.marked;
    border.order.retain(|&p| marked[p]);
    removed.len()
}

/// 将 `border` 中的所有体素并入目标, 返回新增的目标体素个数.
pub fn commit_border(border: &DilationBorder, label: &mut LabelMap) -> usize {
    let mut added = 0;
    for p in border.iter() {
        if !is_object(label[p]) {
            label[p] = OBJECT;
            added += 1;
        }
    }
    added
}

/// 条件膨胀的结果.
#[derive(Clone, Debug)]
pub struct Dilated {
    /// 膨胀后的标签图.
    pub label: LabelMap,

    /// 新增的目标体素个数.
    pub added: usize,
}

/// 条件膨胀: 提取外边界, 按百分位保留较暗部分, 并入目标.
///
/// 只会增加目标体素, 不会移除.
///
/// # 注意
///
/// `scene` 与 `label` 的形状必须一致, 否则程序 panic.
pub fn dilation_conditional(
    adj: &AdjRel3,
    scene: &Scene,
    mut label: LabelMap,
    percentile: u8,
) -> Dilated {
    assert_eq!(scene.dims(), label.dims(), "场景和标签图形状不一致");
    let mut border = dilation_border(adj, &label);
    condition_logged(scene, &label, &mut border, percentile);
    let added = commit_border(&border, &mut label);
    Dilated { label, added }
}

fn condition_logged(
    scene: &Scene,
    label: &LabelMap,
    border: &mut DilationBorder,
    percentile: u8,
) {
    if border.is_empty() {
        log::warn!("dilation: object has no border, nothing to grow");
        return;
    }
    let found = border.len();
    let removed = condition_percentile(border, scene, percentile);
    log::debug!(
        "dilation: {found} border voxels, {removed} above percentile {percentile}, {} object before",
        label.count_object()
    );
}

/// 并发操作部分
#[cfg(feature = "rayon")]
mod par {
    use super::*;

    /// 借助 `rayon`, 并行地运行 `dilation_border`. 结果完全相同.
    ///
    /// 每个非目标体素在反射关系下查找目标邻居, 各体素只写自己的位置.
    pub fn par_dilation_border(adj: &AdjRel3, label: &LabelMap) -> DilationBorder {
        let dims = label.dims();
        let labels = label.as_slice();
        let reflected = adj.reflected();

        let marked: Vec<bool> = (0..labels.len())
            .into_par_iter()
            .map(|q| {
                !is_object(labels[q])
                    && reflected
                        .neighbours_of(dims, q)
                        .any(|p| is_object(labels[p]))
            })
            .collect();
        DilationBorder::from_mask(marked)
    }

    /// 借助 `rayon`, 并行地运行 `dilation_conditional`. 结果完全相同.
    pub fn par_dilation_conditional(
        adj: &AdjRel3,
        scene: &Scene,
        mut label: LabelMap,
        percentile: u8,
    ) -> Dilated {
        assert_eq!(scene.dims(), label.dims(), "场景和标签图形状不一致");
        let mut border = par_dilation_border(adj, &label);
        condition_logged(scene, &label, &mut border, percentile);
        let added = commit_border(&border, &mut label);
        Dilated { label, added }
    }
}

#[cfg(feature = "rayon")]
pub use par::{par_dilation_border, par_dilation_conditional};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dims3;

    /// 第 0 行为目标, 第 1 行为背景, 强度为 `x + 1`.
    fn strip() -> (Scene, LabelMap) {
        let d = Dims3::new(10, 2, 1);
        let s = Scene::from_fn(d, |(x, y, _)| if y == 1 { x as i32 + 1 } else { 0 });
        let l = LabelMap::from_vec(d, (0..d.len()).map(|p| (p < 10) as i32).collect());
        (s, l)
    }

    /// 3x2 网格, 目标体素为 2 和 3. 扫描目标时先遇到地址 1.
    fn crossed() -> (Scene, LabelMap) {
        let d = Dims3::new(3, 2, 1);
        let s = Scene::from_vec(d, vec![7; 6]);
        let l = LabelMap::from_vec(d, vec![0, 0, 1, 1, 0, 0]);
        (s, l)
    }

    fn blob(d: Dims3) -> (Scene, LabelMap) {
        let s = Scene::from_fn(d, |(x, y, z)| ((x * 7 + y * 3 + z * 11) % 5) as i32);
        let l = LabelMap::from_vec(
            d,
            (0..d.len())
                .map(|p| {
                    let (x, y, z) = d.coords(p);
                    ((x * 5 + y * 13 + z * 17) % 7 < 2) as i32
                })
                .collect(),
        );
        (s, l)
    }

    #[test]
    fn test_percentile_cutoff_keeps_darker_half() {
        let (s, l) = strip();
        let adj = AdjRel3::spheric(1.0);
        let mut border = dilation_border(&adj, &l);
        assert_eq!(border.iter().collect::<Vec<_>>(), (10..20).collect::<Vec<_>>());

        // 值 1..10, 截断位置 floor(0.5 * 9) = 4.
        assert_eq!(condition_percentile(&mut border, &s, 50), 5);
        assert_eq!(border.iter().collect::<Vec<_>>(), (10..15).collect::<Vec<_>>());
        assert!(border.contains(14));
        assert!(!border.contains(15));

        let out = dilation_conditional(&adj, &s, l, 50);
        assert_eq!(out.added, 5);
        assert_eq!(out.label.count_object(), 15);
        assert_eq!(out.label[(4, 1, 0)], OBJECT);
        assert_eq!(out.label[(5, 1, 0)], BACKGROUND);
    }

    #[test]
    fn test_percentile_extremes() {
        let (s, l) = strip();
        let adj = AdjRel3::spheric(1.0);
        // 截断位置为 0, 恰好保留最暗的一个.
        let out = dilation_conditional(&adj, &s, l.clone(), 0);
        assert_eq!(out.added, 1);
        assert_eq!(out.label[(0, 1, 0)], OBJECT);

        let out = dilation_conditional(&adj, &s, l.clone(), 100);
        assert_eq!(out.added, 10);
        let out = dilation_conditional(&adj, &s, l, 250);
        assert_eq!(out.added, 10);
    }

    #[test]
    fn test_ties_follow_address_order() {
        let (s, l) = crossed();
        let adj = AdjRel3::spheric(1.0);
        let border = dilation_border(&adj, &l);
        assert_eq!(border.iter().collect::<Vec<_>>(), vec![0, 1, 4, 5]);

        let out = dilation_conditional(&adj, &s, l.clone(), 0);
        assert_eq!(out.added, 1);
        assert_eq!(out.label[0], OBJECT);
        assert_eq!(out.label[1], BACKGROUND);

        let out = dilation_conditional(&adj, &s, l, 50);
        assert_eq!(out.added, 2);
        assert_eq!(out.label.object_addresses(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_border_is_noop() {
        let d = Dims3::new(4, 3, 2);
        let s = Scene::from_vec(d, vec![1; d.len()]);
        let adj = AdjRel3::spheric(1.0);

        let none = LabelMap::new_filled(d, BACKGROUND);
        let out = dilation_conditional(&adj, &s, none.clone(), 50);
        assert_eq!(out.added, 0);
        assert_eq!(out.label, none);

        let all = LabelMap::new_filled(d, OBJECT);
        let out = dilation_conditional(&adj, &s, all.clone(), 50);
        assert_eq!(out.added, 0);
        assert_eq!(out.label, all);
    }

    #[test]
    fn test_dilation_never_removes_object() {
        let (s, l) = blob(Dims3::new(9, 8, 7));
        let adj = AdjRel3::spheric(1.0);
        for pct in [0, 10, 50, 90, 100] {
            let out = dilation_conditional(&adj, &s, l.clone(), pct);
            for p in l.object_addresses() {
                assert_eq!(out.label[p], OBJECT);
            }
            assert_eq!(out.label.count_object(), l.count_object() + out.added);
            if pct > 0 {
                assert!(out.added >= 1);
            }
        }
    }

    #[test]
    fn test_second_pass_keeps_first() {
        let (s, l) = strip();
        let adj = AdjRel3::spheric(1.0);
        let once = dilation_conditional(&adj, &s, l, 50);
        let twice = dilation_conditional(&adj, &s, once.label.clone(), 50);
        for p in once.label.object_addresses() {
            assert_eq!(twice.label[p], OBJECT);
        }
        // 新的边界只剩第 1 行的 5..10, 保留其中较暗的一半.
        assert_eq!(twice.added, 3);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_border_matches_sequential() {
        let (_, l) = crossed();
        let adj = AdjRel3::spheric(1.0);
        assert_eq!(par_dilation_border(&adj, &l), dilation_border(&adj, &l));

        let (s, l) = blob(Dims3::new(11, 9, 6));
        for r in [1.0, 2.0f32.sqrt(), 2.0] {
            let adj = AdjRel3::spheric(r);
            assert_eq!(par_dilation_border(&adj, &l), dilation_border(&adj, &l));
            let a = dilation_conditional(&adj, &s, l.clone(), 40);
            let b = par_dilation_conditional(&adj, &s, l.clone(), 40);
            assert_eq!(a.label, b.label);
            assert_eq!(a.added, b.added);
        }
    }
}
