use serde::Serialize;
use std::fmt;

/// 监考事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProctorEvent {
    /// 退出全屏
    FullscreenExit,
    /// 切换标签页 / 最小化窗口
    PageHidden,
    /// 复制操作
    CopyAttempt,
}

impl ProctorEvent {
    /// 上报给服务端的事件名
    pub fn wire_name(&self) -> &'static str {
        match self {
            ProctorEvent::FullscreenExit => "Exited Fullscreen Mode",
            ProctorEvent::PageHidden => "Switched Tab / Minimized Window",
            ProctorEvent::CopyAttempt => "Copy Attempt Detected",
        }
    }
}

impl fmt::Display for ProctorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// `POST /exam/{examId}/cheat` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct CheatReport<'a> {
    pub event: &'a str,
}

impl<'a> From<&'a ProctorEvent> for CheatReport<'a> {
    fn from(event: &'a ProctorEvent) -> Self {
        Self {
            event: event.wire_name(),
        }
    }
}
