//! 后处理流程集合.

mod dilation;

pub use dilation::{
    commit_border, condition_percentile, dilation_border, dilation_conditional, Dilated,
    DilationBorder,
};

#[cfg(feature = "rayon")]
pub use dilation::{par_dilation_border, par_dilation_conditional};
