//! 监考 - 业务能力层
//!
//! 信号来源（窗口变化、后台切换、宿主转发的复制事件）只在会话期间挂载。
//! `ProctorGuard` 持有所有监听任务，drop 时全部中止，
//! 无论会话是正常结束、超时还是中途离开。
//!
//! 每个事件都立即单独上报，不做节流；上报在后台任务中进行，
//! 不阻塞计时和答题。

use crate::clients::ExamBackend;
use crate::models::ProctorEvent;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// 监考信号来源
pub trait ProctorSource: Send + 'static {
    fn name(&self) -> &'static str;

    /// 启动监听任务，把检测到的事件发到 `tx`
    fn spawn(self: Box<Self>, tx: mpsc::UnboundedSender<ProctorEvent>) -> JoinHandle<()>;
}

/// 会话期间挂载的监听器集合，drop 即卸载
pub struct ProctorGuard {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl ProctorGuard {
    pub fn attach(
        sources: Vec<Box<dyn ProctorSource>>,
        tx: mpsc::UnboundedSender<ProctorEvent>,
    ) -> Self {
        let handles = sources
            .into_iter()
            .map(|source| {
                let name = source.name();
                debug!("挂载监考来源: {}", name);
                (name, source.spawn(tx.clone()))
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 显式卸载（等价于 drop）
    pub fn detach(self) {}
}

impl Drop for ProctorGuard {
    fn drop(&mut self) {
        for (name, handle) in self.handles.drain(..) {
            debug!("卸载监考来源: {}", name);
            handle.abort();
        }
    }
}

/// 监考上报器
pub struct ProctorMonitor {
    backend: Arc<dyn ExamBackend>,
    exam_id: String,
    warnings: AtomicU32,
}

impl ProctorMonitor {
    pub fn new(backend: Arc<dyn ExamBackend>, exam_id: impl Into<String>) -> Self {
        Self {
            backend,
            exam_id: exam_id.into(),
            warnings: AtomicU32::new(0),
        }
    }

    pub fn warnings(&self) -> u32 {
        self.warnings.load(Ordering::SeqCst)
    }

    /// 记录一次违规并在后台上报
    ///
    /// # 返回
    /// 返回累计警告次数和上报任务句柄（调用方通常直接丢弃句柄）
    pub fn report(&self, event: ProctorEvent) -> (u32, JoinHandle<()>) {
        let count = self.warnings.fetch_add(1, Ordering::SeqCst) + 1;
        warn!("⚠ 监考警告 {}: {}", count, event);

        let backend = self.backend.clone();
        let exam_id = self.exam_id.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = backend.report_cheat(&exam_id, event).await {
                error!("监考事件上报失败 ({}): {}", event, e);
            }
        });

        (count, handle)
    }
}

/// 转发宿主推送的事件（例如界面层捕获的复制操作）
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<ProctorEvent>,
}

impl ChannelSource {
    pub fn pair() -> (mpsc::UnboundedSender<ProctorEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

impl ProctorSource for ChannelSource {
    fn name(&self) -> &'static str {
        "host-channel"
    }

    fn spawn(mut self: Box<Self>, tx: mpsc::UnboundedSender<ProctorEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.rx.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        })
    }
}

/// 终端窗口尺寸变化（SIGWINCH）视为退出全屏
#[cfg(unix)]
pub struct WindowResizeSource;

#[cfg(unix)]
impl ProctorSource for WindowResizeSource {
    fn name(&self) -> &'static str {
        "window-resize"
    }

    fn spawn(self: Box<Self>, tx: mpsc::UnboundedSender<ProctorEvent>) -> JoinHandle<()> {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            let mut stream = match signal(SignalKind::window_change()) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("无法监听窗口变化: {}", e);
                    return;
                }
            };
            while stream.recv().await.is_some() {
                if tx.send(ProctorEvent::FullscreenExit).is_err() {
                    break;
                }
            }
        })
    }
}

/// 进程被挂起后恢复（Ctrl+Z 后 fg，SIGCONT）视为切到后台
#[cfg(target_os = "linux")]
pub struct ResumeFromBackgroundSource;

#[cfg(target_os = "linux")]
impl ProctorSource for ResumeFromBackgroundSource {
    fn name(&self) -> &'static str {
        "resume-from-background"
    }

    fn spawn(self: Box<Self>, tx: mpsc::UnboundedSender<ProctorEvent>) -> JoinHandle<()> {
        use tokio::signal::unix::{signal, SignalKind};
        const SIGCONT: i32 = 18;

        tokio::spawn(async move {
            let mut stream = match signal(SignalKind::from_raw(SIGCONT)) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("无法监听 SIGCONT: {}", e);
                    return;
                }
            };
            while stream.recv().await.is_some() {
                if tx.send(ProctorEvent::PageHidden).is_err() {
                    break;
                }
            }
        })
    }
}
