//! 程序运行函数.

use std::fmt;

use oift_berry::filter::gaussian_blur;
use oift_berry::pipeline::{segment_with_report, SegmentReport};
use oift_berry::seeds::{read_seeds, SeedError, SeedSet};
use oift_berry::{Grid3d, Scene, VolumeError};

use crate::args::Args;
use crate::profile::StageTimer;

/// 运行错误.
#[derive(Debug)]
pub enum RunError {
    /// 读取输入体数据或写出标签失败.
    Volume(VolumeError),

    /// 读取种子文件失败.
    Seeds(SeedError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Volume(e) => write!(f, "{e}"),
            RunError::Seeds(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Volume(e) => Some(e),
            RunError::Seeds(e) => Some(e),
        }
    }
}

impl From<VolumeError> for RunError {
    #[inline]
    fn from(e: VolumeError) -> Self {
        RunError::Volume(e)
    }
}

impl From<SeedError> for RunError {
    #[inline]
    fn from(e: SeedError) -> Self {
        RunError::Seeds(e)
    }
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 实际运行: 读取, 平移到非负, 读取种子, 两次平滑, 分割, 写出.
pub fn run(args: &Args) -> Result<SegmentReport, RunError> {
    let mut timer = StageTimer::new();

    let mut scene = Scene::open(&args.volume)?;
    let shift = scene.par_normalize_non_negative();
    let dims = scene.dims();
    log::info!(
        "volume {}x{}x{}, intensity shifted by {shift}",
        dims.nx(),
        dims.ny(),
        dims.nz()
    );
    timer.finish("load");

    let seeds = read_seeds(&args.seeds)?;
    let seeds = SeedSet::from_seeds(&scene, &seeds);
    log::info!("{} seeds ({} dropped)", seeds.len(), seeds.dropped());
    timer.finish("seeds");

    let scene = gaussian_blur(&gaussian_blur(&scene));
    timer.finish("blur");

    let (label, report) = segment_with_report(&scene, &seeds, &args.params);
    timer.finish("segment");

    label.save(&args.output, scene.header())?;
    timer.finish("save");

    timer.log_summary();
    Ok(report)
}
