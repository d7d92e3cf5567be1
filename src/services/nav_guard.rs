//! 离开保护 - 业务能力层
//!
//! 答题期间：后退被吞掉（重新压入当前路由），刷新快捷键被拦截，
//! 离开时给出提示。会话结束后解除，跳转成绩页不受影响。

use crate::infrastructure::{Navigator, Route};
use tracing::{debug, info};

/// 离开页面时的提示
pub const LEAVE_WARNING: &str = "Leaving will end the exam.";

/// 后退请求的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackDecision {
    /// 已拦截，停留在当前路由
    Suppressed,
    /// 未拦截
    Allowed,
}

/// 答题期间的导航保护
pub struct NavigationGuard {
    navigator: Navigator,
    current: Route,
    active: bool,
}

impl NavigationGuard {
    /// 挂载保护，并压入一次当前路由
    pub fn engage(navigator: Navigator, current: Route) -> Self {
        navigator.navigate(current.clone());
        debug!("🛡 导航保护已开启: {}", current);
        Self {
            navigator,
            current,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 处理一次后退
    pub fn on_back(&self) -> BackDecision {
        if self.active {
            debug!("拦截后退，重新压入 {}", self.current);
            self.navigator.navigate(self.current.clone());
            BackDecision::Suppressed
        } else {
            BackDecision::Allowed
        }
    }

    /// 是否拦截该按键（F5、Ctrl+R）
    pub fn intercepts_key(&self, key: &str, ctrl: bool) -> bool {
        self.active && is_reload_shortcut(key, ctrl)
    }

    /// 离开页面时的提示；保护解除后返回 None
    pub fn on_leave(&self) -> Option<&'static str> {
        self.active.then_some(LEAVE_WARNING)
    }

    /// 解除保护
    pub fn lift(&mut self) {
        if self.active {
            self.active = false;
            info!("🛡 导航保护已解除");
        }
    }
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        self.lift();
    }
}

fn is_reload_shortcut(key: &str, ctrl: bool) -> bool {
    key.eq_ignore_ascii_case("F5") || (ctrl && key.eq_ignore_ascii_case("r"))
}
