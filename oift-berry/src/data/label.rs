use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView3};
use nifti::NiftiHeader;

use super::{read_volume, write_volume, Dims3, Grid3d, VolumeError};
use crate::consts::label::*;
use crate::Idx3d;

/// 3D 标签图. 每个体素保存一个 `i32` 标签, 未标注体素为 [`NIL`].
///
/// 流水线的每个阶段独占标签图: 以值传入, 原地修改, 再以值返回.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    dims: Dims3,
    data: Array3<i32>,
}

impl Grid3d for LabelMap {
    #[inline]
    fn dims(&self) -> Dims3 {
        self.dims
    }
}

impl Index<usize> for LabelMap {
    type Output = i32;

    #[inline]
    fn index(&self, p: usize) -> &Self::Output {
        &self.as_slice()[p]
    }
}

impl IndexMut<usize> for LabelMap {
    #[inline]
    fn index_mut(&mut self, p: usize) -> &mut Self::Output {
        &mut self.as_slice_mut()[p]
    }
}

impl Index<Idx3d> for LabelMap {
    type Output = i32;

    #[inline]
    fn index(&self, (x, y, z): Idx3d) -> &Self::Output {
        &self.data[(z, y, x)]
    }
}

impl IndexMut<Idx3d> for LabelMap {
    #[inline]
    fn index_mut(&mut self, (x, y, z): Idx3d) -> &mut Self::Output {
        &mut self.data[(z, y, x)]
    }
}

impl LabelMap {
    /// 创建所有体素均为 `value` 的标签图.
    #[inline]
    pub fn new_filled(dims: Dims3, value: i32) -> Self {
        Self {
            dims,
            data: Array3::from_elem(dims.shape_zyx(), value),
        }
    }

    /// 创建所有体素均未标注 ([`NIL`]) 的标签图.
    #[inline]
    pub fn new_nil(dims: Dims3) -> Self {
        Self::new_filled(dims, NIL)
    }

    /// 由按线性地址排列的标签直接创建.
    ///
    /// # 注意
    ///
    /// `data.len()` 必须等于 `dims.len()`, 否则程序 panic.
    pub fn from_vec(dims: Dims3, data: Vec<i32>) -> Self {
        assert_eq!(dims.len(), data.len(), "数据长度与尺寸不一致");
        // 长度已经检查过, 该操作不会生成 `Err`.
        let data = Array3::from_shape_vec(dims.shape_zyx(), data).unwrap();
        Self { dims, data }
    }

    /// 打开 nii 文件格式的 3D 标签. 非整数标签会被截断.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let (_, dims, data) = read_volume(path.as_ref())?;
        Ok(Self { dims, data })
    }

    /// 将标签图以 nii (或 nii.gz, 由扩展名决定) 格式写入 `path`.
    ///
    /// `reference` 通常是输入场景的 header, 用于保留空间信息.
    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        reference: Option<&NiftiHeader>,
    ) -> Result<(), VolumeError> {
        write_volume(path.as_ref(), reference, &self.data)
    }

    /// 按线性地址排列的全部标签.
    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        // 数据总是以标准布局构造.
        self.data.as_slice().unwrap()
    }

    /// 按线性地址排列的全部标签 (可变).
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [i32] {
        // 数据总是以标准布局构造.
        self.data.as_slice_mut().unwrap()
    }

    /// 获得数据的一份不可变 shallow copy, 形状为 `(nz, ny, nx)`.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i32> {
        self.data.view()
    }

    /// 获取标签值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: i32) -> usize {
        self.data.iter().filter(|l| **l == label).count()
    }

    /// 获取目标体素个数.
    #[inline]
    pub fn count_object(&self) -> usize {
        self.count(OBJECT)
    }

    /// 收集目标体素的线性地址, 升序.
    pub fn object_addresses(&self) -> Vec<usize> {
        self.as_slice()
            .iter()
            .enumerate()
            .filter_map(|(p, l)| is_object(*l).then_some(p))
            .collect()
    }
}
