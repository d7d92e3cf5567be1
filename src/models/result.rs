use crate::models::envelope::{deserialize_count, deserialize_decimal};
use crate::models::exam::MAX_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 成绩状态
///
/// 服务端偶尔返回 `cancel`，统一归为 `Cancelled`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    /// 未通过，仍有剩余次数
    Failed,
    /// 等待人工审核
    Pending,
    /// 三次机会全部用完
    #[serde(alias = "cancel", alias = "canceled")]
    Cancelled,
}

impl ResultStatus {
    /// 状态说明文字
    pub fn message(&self) -> &'static str {
        match self {
            ResultStatus::Passed => {
                "🎉 You have passed the examination. Your result will be sent to your email. You may logout now!"
            }
            ResultStatus::Failed => "You failed. Please retake the examination.",
            ResultStatus::Pending => "⏳ Your exam is pending review. Please wait for results.",
            ResultStatus::Cancelled => {
                "❌ You failed all 3 attempts of the examination. Your result will be sent to your email. You may logout now."
            }
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Passed => "passed",
            ResultStatus::Failed => "failed",
            ResultStatus::Pending => "pending",
            ResultStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// 考生信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub name: String,
    pub company: String,
    pub email: String,
}

/// 本次考试统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    #[serde(default)]
    pub title: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub total_questions: u64,
    /// 得分百分比
    #[serde(rename = "scores", deserialize_with = "deserialize_decimal")]
    pub score_percent: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub pass_mark: u64,
    #[serde(default)]
    pub attempts_used: u32,
    /// 考试时长（分钟）
    #[serde(default)]
    pub duration: Option<u64>,
}

/// 成绩记录（`GET /exam/{userExamId}/result`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub status: ResultStatus,
    #[serde(rename = "exam")]
    pub stats: ExamStats,
    #[serde(rename = "correctCount", default)]
    pub correct_count: u64,
    #[serde(default)]
    pub user: Option<Candidate>,
}

impl ExamResult {
    /// 只有"未通过且还有剩余次数"才允许重考
    pub fn can_retake(&self) -> bool {
        self.status == ResultStatus::Failed && self.stats.attempts_used < MAX_ATTEMPTS
    }
}
