//! 考试首页
//!
//! 加载当前有效考试，展示规则说明，确认后进入答题页。

use crate::clients::ExamClient;
use crate::infrastructure::{Navigator, Route, SessionStore};
use crate::models::{ExamSummary, MAX_ATTEMPTS};
use crate::utils::format_attempts;
use crate::views::logout;
use tracing::{error, info, warn};

pub const EXAM_NOT_FOUND: &str = "Exam data not found.";

/// 考试首页状态
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Loading,
    /// 考试已加载；`confirming` 为 true 时显示规则确认
    Ready {
        exam: ExamSummary,
        confirming: bool,
    },
    /// 没有考试或加载失败，只能登出
    NotFound,
    /// 未登录或令牌失效
    RedirectLogin,
}

#[derive(Debug)]
pub struct CatalogView {
    state: CatalogState,
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogView {
    pub fn new() -> Self {
        Self {
            state: CatalogState::Loading,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn exam(&self) -> Option<&ExamSummary> {
        match &self.state {
            CatalogState::Ready { exam, .. } => Some(exam),
            _ => None,
        }
    }

    /// 加载考试概要并写入 `exam_duration`
    pub async fn load(
        &mut self,
        client: &ExamClient,
        store: &SessionStore,
        navigator: &Navigator,
    ) -> &CatalogState {
        if !store.is_authenticated() {
            navigator.redirect_to_login();
            self.state = CatalogState::RedirectLogin;
            return &self.state;
        }

        self.state = match client.fetch_exam_summary().await {
            Ok(Some(exam)) => {
                if let Err(e) = store.set_exam_duration(exam.duration) {
                    error!("保存考试时长失败: {}", e);
                }
                info!("📋 考试: {} ({} 题, {} 分钟)", exam.title, exam.total_questions, exam.duration);
                CatalogState::Ready {
                    exam,
                    confirming: false,
                }
            }
            Ok(None) => {
                warn!("没有可用的考试");
                CatalogState::NotFound
            }
            Err(e) if e.is_unauthorized() => {
                navigator.redirect_to_login();
                CatalogState::RedirectLogin
            }
            Err(e) => {
                error!("加载考试失败: {}", e);
                CatalogState::NotFound
            }
        };
        &self.state
    }

    /// 打开规则确认
    pub fn request_start(&mut self) -> bool {
        match &mut self.state {
            CatalogState::Ready { confirming, .. } => {
                *confirming = true;
                true
            }
            _ => false,
        }
    }

    /// 取消确认，留在首页
    pub fn cancel_start(&mut self) {
        if let CatalogState::Ready { confirming, .. } = &mut self.state {
            *confirming = false;
        }
    }

    /// 确认开始，跳转到答题页
    pub fn confirm_start(&mut self, navigator: &Navigator) -> Option<Route> {
        let CatalogState::Ready {
            exam,
            confirming: true,
        } = &self.state
        else {
            return None;
        };

        let route = Route::ExamQuestions {
            exam_id: exam.user_exam_id.clone(),
        };
        navigator.navigate(route.clone());
        Some(route)
    }

    /// 规则说明（服务端富文本，原样返回）
    pub fn instructions(&self) -> Option<&str> {
        match &self.state {
            CatalogState::Ready {
                exam,
                confirming: true,
            } => Some(exam.instruction.as_str()),
            _ => None,
        }
    }

    /// 已用次数，例如 `1 of 3`
    pub fn attempts_line(&self) -> Option<String> {
        self.exam()
            .map(|exam| format_attempts(exam.attempts_used, MAX_ATTEMPTS))
    }

    pub async fn logout(&mut self, client: &ExamClient, store: &SessionStore, navigator: &Navigator) {
        logout(client, store, navigator).await;
        self.state = CatalogState::RedirectLogin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_view() -> CatalogView {
        CatalogView {
            state: CatalogState::Ready {
                exam: ExamSummary {
                    title: "Safety Induction".to_string(),
                    description: String::new(),
                    instruction: "<ol><li>No phones</li></ol>".to_string(),
                    total_questions: 20,
                    duration: 10,
                    pass_mark: 75,
                    attempts_used: 1,
                    user_exam_id: "88".to_string(),
                },
                confirming: false,
            },
        }
    }

    #[test]
    fn test_confirm_requires_confirmation_step() {
        let navigator = Navigator::new(Route::Exam);
        let mut view = ready_view();

        assert_eq!(view.confirm_start(&navigator), None);
        assert_eq!(view.instructions(), None);

        assert!(view.request_start());
        assert_eq!(view.instructions(), Some("<ol><li>No phones</li></ol>"));

        let route = view.confirm_start(&navigator).unwrap();
        assert_eq!(route.path(), "/exam/88/questions");
        assert_eq!(navigator.current(), route);
    }

    #[test]
    fn test_cancel_keeps_view() {
        let navigator = Navigator::new(Route::Exam);
        let mut view = ready_view();

        view.request_start();
        view.cancel_start();
        assert_eq!(view.confirm_start(&navigator), None);
        assert_eq!(navigator.current(), Route::Exam);
        assert_eq!(view.attempts_line().as_deref(), Some("1 of 3"));
    }

    #[test]
    fn test_not_found_offers_nothing_to_start() {
        let mut view = CatalogView {
            state: CatalogState::NotFound,
        };
        assert!(!view.request_start());
        assert!(view.exam().is_none());
        assert!(view.attempts_line().is_none());
    }
}
