//! `oiftrelax`: 基于种子点的 3D 体数据分割.
//!
//! 依次执行 OIFT, ORelax 与条件膨胀, 将标签写入 nii 文件.
//!
//! 设置环境变量 `OIFTRELAX_LOG=debug` 可以输出更详细的日志.

use std::process::ExitCode;

use log::LevelFilter;
use simple_logger::SimpleLogger;

mod args;
mod profile;
mod runner;

use args::{Args, USAGE};
use runner::RunError;

fn init_logger() {
    let level = match std::env::var("OIFTRELAX_LOG") {
        Ok(v) if v.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("cannot install logger: {e}");
    }
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(Some(args)) => args,
        // 参数不足时只打印用法, 并正常退出.
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_logger();
    println!("{}", args.output.display());
    log::info!("running on {} threads", runner::cpus());

    match runner::run(&args) {
        Ok(report) => {
            log::info!(
                "{} seeds, {} object voxels ({} added by dilation)",
                report.seeds,
                report.final_object,
                report.dilated_added
            );
            ExitCode::SUCCESS
        }
        Err(RunError::Seeds(e)) => {
            log::error!("{e}");
            println!("Error reading seeds.");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
