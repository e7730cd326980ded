//! 种子点读取与种子集合.
//!
//! 种子文件为文本格式: 第一个整数为种子个数 `n`, 随后是 `n` 组
//! `x y z id label` 五元整数组. 整数之间以任意空白分隔.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::label::*;
use crate::data::{Grid3d, LabelMap};

/// 用户给出的种子点.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Seed {
    /// x 坐标.
    pub x: i64,

    /// y 坐标.
    pub y: i64,

    /// z 坐标.
    pub z: i64,

    /// 种子编号. 分割本身不使用该值.
    pub id: i64,

    /// 种子标签.
    pub label: i32,
}

impl Seed {
    /// 构建种子点.
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64, label: i32) -> Self {
        Self {
            x,
            y,
            z,
            id: 0,
            label,
        }
    }
}

/// 读取种子文件错误.
#[derive(Debug)]
pub enum SeedError {
    /// 底层 I/O 错误.
    Io(std::io::Error),

    /// 文件中没有种子个数.
    MissingCount,

    /// 非法整数. 参数依次为行号 (从 1 开始) 和原始文本.
    Malformed(usize, String),

    /// 种子个数不足. 第一个参数为声明的个数, 第二个参数为实际读到的完整个数.
    Truncated(usize, usize),
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedError::Io(e) => write!(f, "cannot read seeds: {e}"),
            SeedError::MissingCount => write!(f, "seed file has no seed count"),
            SeedError::Malformed(line, text) => {
                write!(f, "line {line}: `{text}` is not an integer")
            }
            SeedError::Truncated(expected, found) => {
                write!(f, "expected {expected} seeds, found {found}")
            }
        }
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SeedError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        SeedError::Io(e)
    }
}

/// 从本地文件 `path` 读取种子点.
pub fn read_seeds<P: AsRef<Path>>(path: P) -> Result<Vec<Seed>, SeedError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_seeds(&text)
}

/// 从文本解析种子点. 声明个数之后多余的内容会被忽略.
pub fn parse_seeds(text: &str) -> Result<Vec<Seed>, SeedError> {
    let mut tokens = text
        .lines()
        .enumerate()
        .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
        .map(|(line, t)| {
            t.parse::<i64>()
                .map_err(|_| SeedError::Malformed(line, t.to_string()))
        });

    let count = tokens.next().ok_or(SeedError::MissingCount)??;
    let count = usize::try_from(count).map_err(|_| SeedError::Malformed(1, count.to_string()))?;

    // 每个种子至少占 10 个字节, 不能按声明的个数预分配.
    let mut ans = Vec::with_capacity(count.min(text.len() / 10 + 1));
    for found in 0..count {
        let mut field = [0i64; 5];
        for v in field.iter_mut() {
            *v = tokens.next().ok_or(SeedError::Truncated(count, found))??;
        }
        let [x, y, z, id, label] = field;
        ans.push(Seed {
            x,
            y,
            z,
            id,
            // 标签超出 `i32` 时截断, 与 C 风格读取一致.
            label: label as i32,
        });
    }
    Ok(ans)
}

/// 过滤后的种子集合: 只保留落在体数据内部的种子, 保持文件顺序.
///
/// 同一地址可能出现多次. [`SeedSet::roots`] 对地址去重, 后出现的标签覆盖
/// 先出现的, 顺序以首次出现为准.
#[derive(Clone, Debug, Default)]
pub struct SeedSet {
    entries: Vec<(usize, i32)>,
    dropped: usize,
}

impl SeedSet {
    /// 将 `seeds` 映射到 `grid` 的线性地址. 越界的种子被丢弃并计数.
    pub fn from_seeds<G: Grid3d>(grid: &G, seeds: &[Seed]) -> Self {
        let dims = grid.dims();
        let entries: Vec<_> = seeds
            .iter()
            .filter_map(|s| dims.checked_address(s.x, s.y, s.z).map(|p| (p, s.label)))
            .collect();
        let dropped = seeds.len() - entries.len();
        if dropped > 0 {
            log::warn!("{dropped} seed(s) outside the volume were dropped");
        }
        Self { entries, dropped }
    }

    /// 保留下来的种子个数 (含重复地址).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何合法种子.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 因越界被丢弃的种子个数.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 按文件顺序迭代 `(地址, 标签)`, 含重复地址.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, i32)> + '_ {
        self.entries.iter().copied()
    }

    /// 去重后的根: 每个地址一项, 后写覆盖, 按首次出现排序.
    pub fn roots(&self) -> Vec<(usize, i32)> {
        let mut slot: HashMap<usize, usize> = HashMap::with_capacity(self.entries.len());
        let mut ans: Vec<(usize, i32)> = Vec::with_capacity(self.entries.len());
        for &(p, l) in self.entries.iter() {
            match slot.get(&p) {
                Some(&i) => ans[i].1 = l,
                None => {
                    slot.insert(p, ans.len());
                    ans.push((p, l));
                }
            }
        }
        ans
    }

    /// 标记种子地址的掩码, 长度为 `len`.
    pub fn mask(&self, len: usize) -> Vec<bool> {
        let mut ans = vec![false; len];
        self.entries.iter().for_each(|&(p, _)| ans[p] = true);
        ans
    }

    /// 将种子标签按文件顺序写入 `label` (后写覆盖).
    pub fn paint(&self, label: &mut LabelMap) {
        for &(p, l) in self.entries.iter() {
            label[p] = l;
        }
    }

    /// 创建初始标签图: 种子处为种子标签, 其它体素为 [`NIL`].
    pub fn initial_labels<G: Grid3d>(&self, grid: &G) -> LabelMap {
        let mut ans = LabelMap::new_filled(grid.dims(), NIL);
        self.paint(&mut ans);
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_seeds, read_seeds, Seed, SeedError, SeedSet};
    use crate::consts::label::*;
    use crate::data::{Dims3, Grid3d};

    #[test]
    fn test_parse_seeds() {
        let s = parse_seeds("2\n0 0 0 7 1\n  3 4 5 8 0\n").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(
            s[1],
            Seed {
                x: 3,
                y: 4,
                z: 5,
                id: 8,
                label: 0
            }
        );

        // 空白不敏感.
        let s = parse_seeds("1 1 2\n3 4\n5").unwrap();
        assert_eq!(s[0].label, 5);
    }

    #[test]
    fn test_parse_seeds_errors() {
        assert!(matches!(parse_seeds("  \n"), Err(SeedError::MissingCount)));
        assert!(matches!(
            parse_seeds("2\n1 1 1 1 1\n2 2 2"),
            Err(SeedError::Truncated(2, 1))
        ));
        match parse_seeds("1\n1 1 x 1 1") {
            Err(SeedError::Malformed(line, text)) => {
                assert_eq!(line, 2);
                assert_eq!(text, "x");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_seeds("-1"), Err(SeedError::Malformed(1, _))));
    }

    #[test]
    fn test_parse_seeds_huge_count() {
        let r = parse_seeds("100000000000000000\n1 1 1 1 1\n");
        assert!(matches!(r, Err(SeedError::Truncated(100000000000000000, 1))));
    }

    #[test]
    fn test_read_seeds_missing_file() {
        let r = read_seeds("/definitely/not/here/seeds.txt");
        assert!(matches!(r, Err(SeedError::Io(_))));
    }

    #[test]
    fn test_seed_set_filtering_and_roots() {
        let d = Dims3::new(4, 4, 4);
        let seeds = [
            Seed::new(0, 0, 0, OBJECT),
            Seed::new(4, 0, 0, OBJECT),
            Seed::new(3, 3, 3, BACKGROUND),
            Seed::new(-1, 0, 0, BACKGROUND),
            Seed::new(0, 0, 0, BACKGROUND),
        ];
        let set = SeedSet::from_seeds(&d, &seeds);
        assert_eq!(set.len(), 3);
        assert_eq!(set.dropped(), 2);

        let far = d.address((3, 3, 3));
        // 重复地址只出现一次, 标签取最后一次, 位置取第一次.
        assert_eq!(set.roots(), vec![(0, BACKGROUND), (far, BACKGROUND)]);

        let l = set.initial_labels(&d);
        assert_eq!(l[0], BACKGROUND);
        assert_eq!(l[far], BACKGROUND);
        assert_eq!(l.count(NIL), 62);

        let mask = set.mask(d.len());
        assert!(mask[0] && mask[far]);
        assert_eq!(mask.iter().filter(|m| **m).count(), 2);
    }
}
