//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::{Dims3, Grid3d, LabelMap, Scene, VolumeError};

pub use crate::consts::label::{BACKGROUND, NIL, OBJECT};

pub use crate::adjacency::AdjRel3;

pub use crate::seeds::{read_seeds, Seed, SeedError, SeedSet};

pub use crate::filter::gaussian_blur;

pub use crate::ift::{oift, orelax, Polarity};

pub use crate::post_proc::dilation_conditional;

pub use crate::pipeline::{segment, segment_with_report, SegmentParams, SegmentReport};
