//! 体素寻址.
//!
//! 线性地址约定为 `p = x + y * nx + z * nx * ny`, 即 `x` 增长最快.
//! 这与 nifti 数据区的存储顺序一致, 也与 `ndarray` 以 `(z, y, x)`
//! 形状存储的标准布局一致.

use crate::Idx3d;

/// 3D 体数据的尺寸 `(nx, ny, nz)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Dims3 {
    nx: usize,
    ny: usize,
    nz: usize,
}

impl Dims3 {
    /// 构建尺寸.
    #[inline]
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// x 方向体素个数.
    #[inline]
    pub const fn nx(&self) -> usize {
        self.nx
    }

    /// y 方向体素个数.
    #[inline]
    pub const fn ny(&self) -> usize {
        self.ny
    }

    /// z 方向体素个数.
    #[inline]
    pub const fn nz(&self) -> usize {
        self.nz
    }

    /// 体素总数.
    #[inline]
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// 是否不含任何体素.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 单个 z 切片的体素个数.
    #[inline]
    pub const fn slice_len(&self) -> usize {
        self.nx * self.ny
    }

    /// 对应的 `ndarray` 形状 `(nz, ny, nx)`.
    #[inline]
    pub const fn shape_zyx(&self) -> (usize, usize, usize) {
        (self.nz, self.ny, self.nx)
    }

    /// 由 `(x, y, z)` 计算线性地址. 不检查越界.
    #[inline]
    pub const fn address(&self, (x, y, z): Idx3d) -> usize {
        x + y * self.nx + z * self.slice_len()
    }

    /// 由线性地址恢复 `(x, y, z)`. 不检查越界.
    #[inline]
    pub const fn coords(&self, p: usize) -> Idx3d {
        let plane = self.slice_len();
        let z = p / plane;
        let rest = p % plane;
        (rest % self.nx, rest / self.nx, z)
    }

    /// 判断有符号坐标是否落在体数据内部.
    #[inline]
    pub fn is_valid_voxel(&self, x: i64, y: i64, z: i64) -> bool {
        (0..self.nx as i64).contains(&x)
            && (0..self.ny as i64).contains(&y)
            && (0..self.nz as i64).contains(&z)
    }

    /// 判断线性地址是否合法.
    #[inline]
    pub const fn is_valid_address(&self, p: usize) -> bool {
        p < self.len()
    }

    /// 有符号坐标合法时返回其线性地址, 否则返回 `None`.
    #[inline]
    pub fn checked_address(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        self.is_valid_voxel(x, y, z)
            .then(|| self.address((x as usize, y as usize, z as usize)))
    }
}

/// 以线性地址访问的 3D 体数据的共用属性.
pub trait Grid3d {
    /// 获取尺寸.
    fn dims(&self) -> Dims3;

    /// 体素总数.
    #[inline]
    fn len(&self) -> usize {
        self.dims().len()
    }

    /// 是否不含任何体素.
    #[inline]
    fn is_empty(&self) -> bool {
        self.dims().is_empty()
    }

    /// 由 `(x, y, z)` 计算线性地址. 不检查越界.
    #[inline]
    fn address(&self, pos: Idx3d) -> usize {
        self.dims().address(pos)
    }

    /// 由线性地址恢复 `(x, y, z)`. 不检查越界.
    #[inline]
    fn coords(&self, p: usize) -> Idx3d {
        self.dims().coords(p)
    }

    /// 判断有符号坐标是否落在体数据内部.
    #[inline]
    fn is_valid_voxel(&self, x: i64, y: i64, z: i64) -> bool {
        self.dims().is_valid_voxel(x, y, z)
    }

    /// 判断线性地址是否合法.
    #[inline]
    fn is_valid_address(&self, p: usize) -> bool {
        self.dims().is_valid_address(p)
    }
}

impl Grid3d for Dims3 {
    #[inline]
    fn dims(&self) -> Dims3 {
        *self
    }
}
