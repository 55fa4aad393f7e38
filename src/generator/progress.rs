use std::sync::{Arc, Mutex};

/// 进度展示的接收端，例如终端或界面进度条
pub trait ProgressSink: Send + Sync {
    fn report(&self, percentage: u8, message: &str);
}

/// 在终端输出进度
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&self, percentage: u8, message: &str) {
        eprintln!("[{:>3}%] {}", percentage, message);
    }
}

/// 丢弃所有进度
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn report(&self, _percentage: u8, _message: &str) {}
}

/// 保证百分比单调不减的进度上报器
///
/// 并行分支可能以任意顺序上报，比当前值小的百分比会被提升到当前值，消息照常转发。
#[derive(Clone)]
pub struct ProgressTracker {
    sink: Arc<dyn ProgressSink>,
    current: Arc<Mutex<u8>>,
}

impl ProgressTracker {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            current: Arc::new(Mutex::new(0)),
        }
    }

    pub fn report(&self, percentage: u8, message: &str) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = (*current).max(percentage.min(100));
        self.sink.report(*current, message);
    }

    /// 以当前百分比上报一条消息
    pub fn message(&self, message: &str) {
        self.report(0, message);
    }

    pub fn current(&self) -> u8 {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(SilentProgress))
    }
}
