//! 命令行参数.

use std::fmt;
use std::path::PathBuf;

use oift_berry::pipeline::{ParamsError, SegmentParams};

/// 必需的位置参数个数 (不含程序名).
pub const REQUIRED: usize = 6;

/// 用法说明.
pub const USAGE: &str = "usage:
oiftrelax <volume> <file_seeds> <pol> <niter> <percentile> <output_file>
\t pol.... Boundary polarity. It can be in the range [-1.0, 1.0]
\t niter.. Number of iterations of the relaxation procedure.
\t percentile.. Percentage of the darker dilation border added to the object [0, 100]
\t output_file.. Output label file name (e.g., label.nii.gz)";

/// 解析后的参数.
#[derive(Clone, Debug)]
pub struct Args {
    /// 输入体数据.
    pub volume: PathBuf,

    /// 种子文件.
    pub seeds: PathBuf,

    /// 分割参数.
    pub params: SegmentParams,

    /// 输出标签文件.
    pub output: PathBuf,
}

/// 参数错误.
#[derive(Debug)]
pub enum ArgsError {
    /// 极性不是浮点数.
    Polarity(String),

    /// 迭代次数不是非负整数.
    Iterations(String),

    /// 百分位不是 `[0, 255]` 内的整数.
    Percentile(String),

    /// 数值合法但超出范围.
    Params(ParamsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::Polarity(s) => write!(f, "invalid polarity `{s}`"),
            ArgsError::Iterations(s) => write!(f, "invalid iteration count `{s}`"),
            ArgsError::Percentile(s) => write!(f, "invalid percentile `{s}`"),
            ArgsError::Params(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::Params(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamsError> for ArgsError {
    #[inline]
    fn from(e: ParamsError) -> Self {
        ArgsError::Params(e)
    }
}

impl Args {
    /// 由位置参数 (不含程序名) 解析. 参数个数不足时返回 `Ok(None)`.
    /// 多余的参数被忽略.
    pub fn parse<S: AsRef<str>>(argv: &[S]) -> Result<Option<Self>, ArgsError> {
        if argv.len() < REQUIRED {
            return Ok(None);
        }
        let arg = |i: usize| argv[i].as_ref().trim();

        let pol: f32 = arg(2)
            .parse()
            .map_err(|_| ArgsError::Polarity(arg(2).to_string()))?;
        let niter: u32 = arg(3)
            .parse()
            .map_err(|_| ArgsError::Iterations(arg(3).to_string()))?;
        let percentile: u8 = arg(4)
            .parse()
            .map_err(|_| ArgsError::Percentile(arg(4).to_string()))?;

        Ok(Some(Self {
            volume: PathBuf::from(arg(0)),
            seeds: PathBuf::from(arg(1)),
            params: SegmentParams::new(pol, niter, percentile)?,
            output: PathBuf::from(arg(5)),
        }))
    }
}
