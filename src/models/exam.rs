use crate::models::envelope::{deserialize_count, deserialize_id};
use serde::{Deserialize, Serialize};

/// 每场考试允许的最大尝试次数
pub const MAX_ATTEMPTS: u32 = 3;

/// 考试概要（`GET /exam/detail` 中的第一项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    /// 服务端字段为 `exam_title`
    #[serde(rename = "exam_title", alias = "title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 富文本说明，原样显示
    #[serde(default)]
    pub instruction: String,
    /// 题目总数
    #[serde(rename = "questions", deserialize_with = "deserialize_count")]
    pub total_questions: u64,
    /// 考试时长（分钟）
    #[serde(deserialize_with = "deserialize_count")]
    pub duration: u64,
    /// 及格线（百分比）
    #[serde(deserialize_with = "deserialize_count")]
    pub pass_mark: u64,
    /// 已用次数
    #[serde(rename = "attempt_used", default)]
    pub attempts_used: u32,
    /// 开始答题时使用的 ID
    #[serde(deserialize_with = "deserialize_id")]
    pub user_exam_id: String,
}
