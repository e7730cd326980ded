//! 3D 体数据: 强度场景 ([`Scene`]) 与标签图 ([`LabelMap`]).

use std::fmt;
use std::path::Path;

use ndarray::Array3;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

mod label;
mod scene;
mod shape;

pub use label::LabelMap;
pub use scene::Scene;
pub use shape::{Dims3, Grid3d};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 读写 nii 体数据时的错误.
#[derive(Debug)]
pub enum VolumeError {
    /// 底层 nifti 读写错误 (包括 I/O 错误).
    Nifti(nifti::NiftiError),

    /// 数据不是 3D 体数据. 参数为 header 中的 `dim`.
    NotVolume([u16; 8]),
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::Nifti(e) => write!(f, "nifti error: {e}"),
            VolumeError::NotVolume(dim) => write!(f, "not a 3D volume (dim = {dim:?})"),
        }
    }
}

impl std::error::Error for VolumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VolumeError::Nifti(e) => Some(e),
            VolumeError::NotVolume(_) => None,
        }
    }
}

impl From<nifti::NiftiError> for VolumeError {
    #[inline]
    fn from(e: nifti::NiftiError) -> Self {
        VolumeError::Nifti(e)
    }
}

/// 从 header 中读取 `(nx, ny, nz)`. 第 4 维及以上必须退化为 1.
fn dims_from_header(h: &NiftiHeader) -> Result<Dims3, VolumeError> {
    let [ndim, nx, ny, nz, ref extra @ ..] = h.dim;
    let ndim = ndim as usize;
    if !(3..=7).contains(&ndim) || extra[..ndim - 3].iter().any(|&d| d > 1) {
        return Err(VolumeError::NotVolume(h.dim));
    }
    Ok(Dims3::new(nx as usize, ny as usize, nz as usize))
}

/// 打开 nii 文件, 返回 header 和按线性地址排列的 `(nz, ny, nx)` 数组.
fn read_volume(path: &Path) -> Result<(BoxedHeader, Dims3, Array3<i32>), VolumeError> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = Box::new(obj.header().clone());
    let dims = dims_from_header(&header)?;

    // [x, y, z, ..] 逻辑顺序. 反转坐标轴后按逻辑顺序遍历, 即得 x 增长最快的线性序.
    let data = obj.into_volume().into_ndarray::<i32>()?;
    if data.len() != dims.len() {
        return Err(VolumeError::NotVolume(header.dim));
    }
    let raw: Vec<i32> = data.t().iter().copied().collect();

    // 长度已经检查过, 该操作不会生成 `Err`.
    let data = Array3::from_shape_vec(dims.shape_zyx(), raw).unwrap();
    Ok((header, dims, data))
}

/// 将 `(nz, ny, nx)` 数组以 `[x, y, z]` 逻辑顺序写入 nii 文件.
///
/// 若给出 `reference`, 则沿用其空间信息, 但会重置数据缩放系数.
fn write_volume(
    path: &Path,
    reference: Option<&NiftiHeader>,
    data: &Array3<i32>,
) -> Result<(), VolumeError> {
    let view = data.t();
    match reference {
        Some(h) => {
            let mut header = h.clone();
            header.scl_slope = 1.0;
            header.scl_inter = 0.0;
            nifti::writer::WriterOptions::new(path)
                .reference_header(&header)
                .write_nifti(&view)?;
        }
        None => nifti::writer::WriterOptions::new(path).write_nifti(&view)?,
    }
    Ok(())
}
