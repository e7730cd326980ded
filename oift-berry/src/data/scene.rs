use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView3};
use nifti::NiftiHeader;

use super::{read_volume, BoxedHeader, Dims3, Grid3d, VolumeError};
use crate::Idx3d;

/// 3D 强度场景. 体素值以 `i32` 保存.
///
/// 分割开始前应调用 [`Scene::normalize_non_negative`],
/// 代价函数假设所有强度非负.
#[derive(Debug, Clone)]
pub struct Scene {
    header: Option<BoxedHeader>,
    dims: Dims3,
    data: Array3<i32>,
}

impl Grid3d for Scene {
    #[inline]
    fn dims(&self) -> Dims3 {
        self.dims
    }
}

impl Index<usize> for Scene {
    type Output = i32;

    #[inline]
    fn index(&self, p: usize) -> &Self::Output {
        &self.as_slice()[p]
    }
}

impl Index<Idx3d> for Scene {
    type Output = i32;

    #[inline]
    fn index(&self, (x, y, z): Idx3d) -> &Self::Output {
        &self.data[(z, y, x)]
    }
}

impl Scene {
    /// 打开 nii (或 nii.gz) 文件格式的 3D 体数据. header 会被保留,
    /// 以便输出标签时沿用其空间信息.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let (header, dims, data) = read_volume(path.as_ref())?;
        Ok(Self {
            header: Some(header),
            dims,
            data,
        })
    }

    /// 由按线性地址排列的数据直接创建场景.
    ///
    /// # 注意
    ///
    /// `data.len()` 必须等于 `dims.len()`, 否则程序 panic.
    pub fn from_vec(dims: Dims3, data: Vec<i32>) -> Self {
        assert_eq!(dims.len(), data.len(), "数据长度与尺寸不一致");
        // 长度已经检查过, 该操作不会生成 `Err`.
        let data = Array3::from_shape_vec(dims.shape_zyx(), data).unwrap();
        Self {
            header: None,
            dims,
            data,
        }
    }

    /// 以 `f(x, y, z)` 生成每个体素的值.
    pub fn from_fn<F: Fn(Idx3d) -> i32>(dims: Dims3, f: F) -> Self {
        let data = (0..dims.len()).map(|p| f(dims.coords(p))).collect();
        Self::from_vec(dims, data)
    }

    /// 以 `data` 替换体素值, 沿用 `self` 的 header. 形状必须一致.
    pub(crate) fn with_data(&self, data: Vec<i32>) -> Self {
        let mut ans = Self::from_vec(self.dims, data);
        ans.header = self.header.clone();
        ans
    }

    /// 获取 nii header. 由内存数据创建的场景没有 header.
    #[inline]
    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// 按线性地址排列的全部体素值.
    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        // 数据总是以标准布局构造.
        self.data.as_slice().unwrap()
    }

    /// 获得数据的一份不可变 shallow copy, 形状为 `(nz, ny, nx)`.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i32> {
        self.data.view()
    }

    /// 最小体素值. 空场景返回 0.
    pub fn min_value(&self) -> i32 {
        self.data.iter().copied().min().unwrap_or(0)
    }

    /// 最大体素值. 空场景返回 0.
    pub fn max_value(&self) -> i32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// 若最小值为负, 则将所有体素平移 `-min`, 使其全部非负.
    ///
    /// 返回实际平移量 (无需平移时为 0).
    pub fn normalize_non_negative(&mut self) -> i32 {
        let shift = self.normalizing_shift();
        if shift != 0 {
            self.data.iter_mut().for_each(|v| *v += shift);
        }
        shift
    }

    #[inline]
    fn normalizing_shift(&self) -> i32 {
        let min = self.min_value();
        if min < 0 {
            -min
        } else {
            0
        }
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl Scene {
    /// 借助 `rayon`, 并行地运行 `self.normalize_non_negative`.
    pub fn par_normalize_non_negative(&mut self) -> i32 {
        let shift = self.normalizing_shift();
        if shift != 0 {
            self.data.par_map_inplace(|v| *v += shift);
        }
        shift
    }
}

#[cfg(test)]
mod tests {
    use super::Scene;
    use crate::data::{Dims3, Grid3d};

    #[test]
    fn test_scene_indexing() {
        let d = Dims3::new(3, 2, 2);
        let s = Scene::from_fn(d, |(x, y, z)| (x + 10 * y + 100 * z) as i32);
        assert_eq!(s.len(), 12);
        assert_eq!(s[(2, 1, 1)], 112);
        assert_eq!(s[d.address((2, 1, 1))], 112);
        assert_eq!(s[5], 12);
        assert_eq!(s.min_value(), 0);
        assert_eq!(s.max_value(), 112);
        assert!(s.header().is_none());
    }

    #[test]
    fn test_normalize_negative() {
        let mut s = Scene::from_vec(Dims3::new(2, 2, 1), vec![-5, 0, 3, -1]);
        assert_eq!(s.normalize_non_negative(), 5);
        assert_eq!(s.as_slice(), &[0, 5, 8, 4]);
        // 幂等.
        assert_eq!(s.normalize_non_negative(), 0);
        assert_eq!(s.as_slice(), &[0, 5, 8, 4]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_normalize_matches() {
        let raw: Vec<i32> = (0..60).map(|v| v * 7 % 23 - 11).collect();
        let mut a = Scene::from_vec(Dims3::new(5, 4, 3), raw.clone());
        let mut b = Scene::from_vec(Dims3::new(5, 4, 3), raw);
        assert_eq!(a.normalize_non_negative(), b.par_normalize_non_negative());
        assert_eq!(a.as_slice(), b.as_slice());
        assert!(b.min_value() >= 0);
    }
}
