//! 成绩页
//!
//! 每次进入只拉取一次成绩，同时清掉残留的剩余时间。
//! 拉取失败时停留在加载状态。

use crate::clients::ExamClient;
use crate::infrastructure::{Navigator, Route, SessionStore};
use crate::models::{ExamResult, ResultStatus, MAX_ATTEMPTS};
use crate::utils::format_attempts;
use crate::views::logout;
use tracing::{error, info};

/// 成绩页状态
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Loading,
    Loaded(ExamResult),
}

#[derive(Debug)]
pub struct ResultView {
    user_exam_id: String,
    state: ResultState,
    fetched: bool,
}

impl ResultView {
    pub fn new(user_exam_id: impl Into<String>) -> Self {
        Self {
            user_exam_id: user_exam_id.into(),
            state: ResultState::Loading,
            fetched: false,
        }
    }

    pub fn state(&self) -> &ResultState {
        &self.state
    }

    pub fn result(&self) -> Option<&ExamResult> {
        match &self.state {
            ResultState::Loaded(result) => Some(result),
            ResultState::Loading => None,
        }
    }

    /// 拉取成绩；同一个视图只会真正请求一次
    pub async fn load(&mut self, client: &ExamClient, store: &SessionStore) -> &ResultState {
        if self.fetched {
            return &self.state;
        }
        self.fetched = true;

        if let Err(e) = store.clear_remaining_time() {
            error!("清除剩余时间失败: {}", e);
        }

        match client.fetch_result(&self.user_exam_id).await {
            Ok(result) => {
                info!(
                    "📊 成绩: {} ({}%, {}/{})",
                    result.status,
                    result.stats.score_percent,
                    result.correct_count,
                    result.stats.total_questions
                );
                self.state = ResultState::Loaded(result);
            }
            Err(e) => error!("加载成绩失败: {}", e),
        }
        &self.state
    }

    pub fn can_retake(&self) -> bool {
        self.result().map(|r| r.can_retake()).unwrap_or(false)
    }

    /// 重考：回到考试首页
    pub fn retake(&self, navigator: &Navigator) -> bool {
        if !self.can_retake() {
            return false;
        }
        navigator.navigate(Route::Exam);
        true
    }

    pub async fn logout(&self, client: &ExamClient, store: &SessionStore, navigator: &Navigator) {
        logout(client, store, navigator).await;
    }
}

/// 成绩页的结语
pub fn closing_message(status: ResultStatus) -> Option<&'static str> {
    match status {
        ResultStatus::Passed => Some(
            "You have successfully completed your certification. Please log out to secure your session.",
        ),
        ResultStatus::Cancelled => Some(
            "You have reached the maximum of 3 exam attempts. Your account is temporarily locked.",
        ),
        ResultStatus::Failed => {
            Some("You did not pass this time. Review materials and try again or log out.")
        }
        ResultStatus::Pending => None,
    }
}

/// 统计信息的标签和值
pub fn stat_lines(result: &ExamResult) -> Vec<(&'static str, String)> {
    let stats = &result.stats;
    vec![
        ("Total Questions", stats.total_questions.to_string()),
        ("Correct Answers", result.correct_count.to_string()),
        ("Score", format!("{}%", stats.score_percent)),
        ("Passing Rate", format!("{}%", stats.pass_mark)),
        (
            "Attempts Used",
            format_attempts(stats.attempts_used, MAX_ATTEMPTS),
        ),
        (
            "Duration",
            stats
                .duration
                .map(|d| format!("{} min", d))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ]
}
