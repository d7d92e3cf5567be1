//! 路由与导航信号
//!
//! 视图之间通过 `Navigator` 跳转；网关的强制登出也通过它把用户送回登录页。

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// 客户端路由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// 未登录入口 `/`
    Login,
    /// 考试首页 `/exam`
    Exam,
    /// 答题页 `/exam/{examId}/questions`
    ExamQuestions { exam_id: String },
    /// 成绩页 `/exam/{userExamId}/results`
    ExamResult { user_exam_id: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::Exam => "/exam".to_string(),
            Route::ExamQuestions { exam_id } => format!("/exam/{}/questions", exam_id),
            Route::ExamResult { user_exam_id } => format!("/exam/{}/results", user_exam_id),
        }
    }

    /// 解析路径；未知路径返回 None
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Login),
            ["exam"] => Some(Route::Exam),
            ["exam", id, "questions"] => Some(Route::ExamQuestions {
                exam_id: id.to_string(),
            }),
            ["exam", id, "results"] => Some(Route::ExamResult {
                user_exam_id: id.to_string(),
            }),
            _ => None,
        }
    }

    /// 是否需要登录后才能访问
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// 导航器
///
/// 克隆后共享同一个当前路由；订阅者可以感知任何来源的跳转。
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    pub fn navigate(&self, route: Route) {
        debug!("导航到 {}", route);
        self.tx.send_replace(route);
    }

    /// 强制回到登录页
    pub fn redirect_to_login(&self) {
        self.navigate(Route::Login);
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths_round_trip() {
        let routes = [
            Route::Login,
            Route::Exam,
            Route::ExamQuestions {
                exam_id: "42".to_string(),
            },
            Route::ExamResult {
                user_exam_id: "42".to_string(),
            },
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/exam/42/unknown"), None);
    }

    #[test]
    fn test_only_login_is_public() {
        assert!(!Route::Login.requires_auth());
        assert!(Route::Exam.requires_auth());
    }

    #[test]
    fn test_subscribers_see_redirect() {
        let navigator = Navigator::new(Route::Exam);
        let mut rx = navigator.subscribe();

        navigator.clone().redirect_to_login();

        tokio_test::block_on(rx.changed()).unwrap();
        assert_eq!(*rx.borrow(), Route::Login);
        assert_eq!(navigator.current(), Route::Login);
    }
}
