use crate::models::envelope::deserialize_id;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 选项标签 A–D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    /// 不区分大小写解析 `"a"` / `"B"` 等
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            OptionLabel::A => 'A',
            OptionLabel::B => 'B',
            OptionLabel::C => 'C',
            OptionLabel::D => 'D',
        };
        write!(f, "{}", c)
    }
}

/// 单个选项：原始标签 + 文本
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AnswerOption {
    pub label: OptionLabel,
    pub text: String,
}

/// 一道选择题
///
/// 选项顺序在拉取后打乱一次，之后整个会话内不变；
/// 标签始终是服务端给出的原始标签。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: String,
    pub stem: String,
    pub options: Vec<AnswerOption>,
    /// 正确选项（仅在提交答案后展示）
    pub correct: Option<OptionLabel>,
    pub explanation: Option<String>,
}

impl Question {
    pub fn option(&self, label: OptionLabel) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.label == label)
    }

    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.correct.and_then(|label| self.option(label))
    }
}

/// 接口返回的题目项 `{ id, correct, question: {...} }`
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub correct: Option<String>,
    pub question: QuestionBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionBody {
    pub question_stem: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl From<QuestionItem> for Question {
    fn from(item: QuestionItem) -> Self {
        let QuestionBody {
            question_stem,
            option_a,
            option_b,
            option_c,
            option_d,
            explanation,
        } = item.question;

        let options = OptionLabel::ALL
            .into_iter()
            .zip([option_a, option_b, option_c, option_d])
            .map(|(label, text)| AnswerOption { label, text })
            .collect();

        Self {
            id: item.id,
            stem: question_stem,
            options,
            correct: item.correct.as_deref().and_then(OptionLabel::parse),
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// 提交答案的响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AnswerVerdict {
    pub is_correct: bool,
}
