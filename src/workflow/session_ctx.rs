//! 答题会话上下文
//!
//! 封装"我正在答哪场考试"这一信息

use crate::infrastructure::{Route, SessionStore};
use std::fmt::Display;

/// 答题会话上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCtx {
    /// 考试ID（即路由里的 examId）
    pub exam_id: String,

    /// 考试时长（分钟），来自考试首页写入的 `exam_duration`
    pub duration_minutes: Option<u64>,
}

impl SessionCtx {
    pub fn new(exam_id: impl Into<String>, duration_minutes: Option<u64>) -> Self {
        Self {
            exam_id: exam_id.into(),
            duration_minutes,
        }
    }

    /// 从会话存储中读取时长
    pub fn from_store(exam_id: impl Into<String>, store: &SessionStore) -> Self {
        Self::new(exam_id, store.exam_duration())
    }

    /// 本场考试的答题页路由
    pub fn questions_route(&self) -> Route {
        Route::ExamQuestions {
            exam_id: self.exam_id.clone(),
        }
    }

    /// 本场考试的成绩页路由
    pub fn result_route(&self) -> Route {
        Route::ExamResult {
            user_exam_id: self.exam_id.clone(),
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.duration_minutes {
            Some(minutes) => write!(f, "[考试 ID#{} 时长#{}分钟]", self.exam_id, minutes),
            None => write!(f, "[考试 ID#{} 时长#未知]", self.exam_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_reads_duration() {
        let store = SessionStore::in_memory();
        store.set_exam_duration(30).unwrap();

        let ctx = SessionCtx::from_store("12", &store);
        assert_eq!(ctx.duration_minutes, Some(30));
        assert_eq!(ctx.result_route().path(), "/exam/12/results");
        assert_eq!(ctx.to_string(), "[考试 ID#12 时长#30分钟]");
    }
}
