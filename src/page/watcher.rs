//! 文档变化监听
//!
//! 启动时无条件扫描一次；之后每一批变化只触发一次扫描：批次中的第一条通知安排在
//! `first + 500ms` 执行，静默期内的其余通知被吸收。

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::tree::{DocumentTree, MutationStream};
use super::PageSession;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// 显式的去抖状态
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// 记录一次通知；只有开启新批次时返回 `true`
    pub fn notify(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.quiet_period);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn due(&self, now: Instant) -> bool {
        self.deadline.map(|deadline| deadline <= now).unwrap_or(false)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn reschedule(&mut self, at: Instant) {
        self.deadline = Some(at);
    }
}

pub struct MutationWatcher<T> {
    session: PageSession<T>,
    stream: MutationStream,
    debouncer: Debouncer,
}

impl<T: DocumentTree + 'static> MutationWatcher<T> {
    /// 订阅只在这里发生一次
    pub fn new(session: PageSession<T>) -> Self {
        let stream = session.tree().observe();
        Self {
            session,
            stream,
            debouncer: Debouncer::default(),
        }
    }

    pub fn with_debouncer(mut self, debouncer: Debouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    /// 运行到变化流关闭为止
    pub async fn run(mut self) {
        let started = self.session.run_pass();
        tracing::info!(started, "变化监听已启动");

        loop {
            let deadline = self.debouncer.deadline();
            let armed = deadline.is_some();
            let wake_at = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                mutation = self.stream.next() => {
                    let Some(mutation) = mutation else {
                        break;
                    };
                    if !self.session.preferences().get().enabled {
                        tracing::trace!(?mutation, "翻译已禁用，忽略变化");
                        continue;
                    }
                    if self.debouncer.notify(Instant::now()) {
                        tracing::trace!(?mutation, "安排扫描");
                    }
                }
                _ = sleep_until(wake_at), if armed => {
                    self.debouncer.cancel();
                    let started = self.session.run_pass();
                    tracing::debug!(started, "批次扫描");
                }
            }
        }

        tracing::info!("变化流已关闭，监听结束");
    }

    /// 在当前 `LocalSet` 上运行
    pub fn spawn(self) -> WatcherHandle {
        WatcherHandle {
            task: tokio::task::spawn_local(self.run()),
        }
    }
}

/// 丢弃或停止时终止监听
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
