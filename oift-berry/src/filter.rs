//! 分割前的平滑滤波.

use crate::data::{Dims3, Grid3d, Scene};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 对 `scene` 做一次 3x3x3 高斯平滑, 返回新的场景 (沿用原 header).
///
/// 核为三个方向上 `[1, 2, 1] / 4` 的可分离二项式核, 每个方向单独四舍五入
/// 到整数. 边界外的体素取最近的边界体素值.
pub fn gaussian_blur(scene: &Scene) -> Scene {
    let dims = scene.dims();
    let mut data = scene.as_slice().to_vec();
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        data = blur_along(&data, dims, axis);
    }
    scene.with_data(data)
}

#[derive(Copy, Clone)]
enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// 沿该方向相邻两个体素的地址差.
    #[inline]
    fn stride(self, dims: Dims3) -> usize {
        match self {
            Axis::X => 1,
            Axis::Y => dims.nx(),
            Axis::Z => dims.slice_len(),
        }
    }

    /// 体素 `p` 在该方向上的坐标和该方向的长度.
    #[inline]
    fn coord(self, dims: Dims3, p: usize) -> (usize, usize) {
        let (x, y, z) = dims.coords(p);
        match self {
            Axis::X => (x, dims.nx()),
            Axis::Y => (y, dims.ny()),
            Axis::Z => (z, dims.nz()),
        }
    }
}

#[inline]
fn blur_at(src: &[i32], dims: Dims3, axis: Axis, p: usize) -> i32 {
    let stride = axis.stride(dims);
    let (c, extent) = axis.coord(dims, p);
    let prev = if c > 0 { p - stride } else { p };
    let next = if c + 1 < extent { p + stride } else { p };
    let sum = src[prev] as i64 + 2 * src[p] as i64 + src[next] as i64;
    (sum + 2).div_euclid(4) as i32
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn blur_along(src: &[i32], dims: Dims3, axis: Axis) -> Vec<i32> {
            (0..src.len())
                .into_par_iter()
                .map(|p| blur_at(src, dims, axis, p))
                .collect()
        }
    } else {
        fn blur_along(src: &[i32], dims: Dims3, axis: Axis) -> Vec<i32> {
            (0..src.len()).map(|p| blur_at(src, dims, axis, p)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::gaussian_blur;
    use crate::data::{Dims3, Grid3d, Scene};

    #[test]
    fn test_blur_constant_is_fixed() {
        let d = Dims3::new(4, 5, 3);
        let s = Scene::from_vec(d, vec![37; d.len()]);
        assert_eq!(gaussian_blur(&s).as_slice(), s.as_slice());
    }

    #[test]
    fn test_blur_impulse() {
        let d = Dims3::new(3, 3, 3);
        let s = Scene::from_fn(d, |p| if p == (1, 1, 1) { 640 } else { 0 });
        let b = gaussian_blur(&s);
        assert_eq!(b[(1, 1, 1)], 80);
        assert_eq!(b[(0, 1, 1)], 40);
        assert_eq!(b[(1, 2, 1)], 40);
        assert_eq!(b[(0, 0, 1)], 20);
        assert_eq!(b[(2, 2, 2)], 10);
        assert_eq!(b.as_slice().iter().sum::<i32>(), 640);
    }

    #[test]
    fn test_blur_ramp_borders_replicated() {
        let d = Dims3::new(10, 2, 2);
        let s = Scene::from_fn(d, |(x, _, _)| 4 * x as i32);
        let b = gaussian_blur(&s);
        for x in 1..9 {
            assert_eq!(b[(x, 1, 0)], 4 * x as i32);
        }
        assert_eq!(b[(0, 0, 0)], 1);
        assert_eq!(b[(9, 1, 1)], 35);
        assert_eq!(b.dims(), d);
    }
}
