//! 运行计时.

use std::time::{Duration, Instant};

/// 分阶段计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
/// 每次 `self.finish()` 都会记录一个阶段.
#[derive(Clone, Debug)]
pub struct StageTimer {
    consumed: Duration,
    since: Instant,
    stages: Vec<(&'static str, Duration)>,
}

impl StageTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
            stages: vec![],
        }
    }

    /// 开始计时. 两次 `self.finish()` 之间不需要计时的部分可以用它跳过.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束阶段 `name` 的计时并累加, 随后立即开始下一阶段. 返回本阶段时长.
    pub fn finish(&mut self, name: &'static str) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        self.stages.push((name, d));
        log::debug!("{name}: {} ms", d.as_millis());
        self.start();
        d
    }

    /// 获得总共累计下来的时间 (以毫秒为单位).
    #[inline]
    pub fn total_ms(&self) -> u128 {
        self.consumed.as_millis()
    }

    /// 按顺序迭代所有已记录的阶段.
    #[inline]
    pub fn stages(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.stages.iter().copied()
    }

    /// 以 `info` 级别输出所有阶段的耗时.
    pub fn log_summary(&self) {
        for (name, d) in self.stages() {
            log::info!("{name:>8}: {:>8} ms", d.as_millis());
        }
        log::info!("{:>8}: {:>8} ms", "total", self.total_ms());
    }
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::StageTimer;
    use std::time::Duration;

    #[test]
    fn test_stage_timer() {
        let mut t = StageTimer::new();
        std::thread::sleep(Duration::from_millis(2));
        let a = t.finish("a");
        t.start();
        let b = t.finish("b");
        assert!(a >= Duration::from_millis(2));
        let names: Vec<_> = t.stages().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(t.total_ms(), (a + b).as_millis());
    }
}
