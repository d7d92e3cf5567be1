//! 测试用的内存后端

use crate::clients::ExamBackend;
use crate::error::ApiError;
use crate::models::{AnswerOption, OptionLabel, ProctorEvent, Question};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 四个选项的题目，正确答案为 A
pub(crate) fn question(id: &str, stem: &str) -> Question {
    Question {
        id: id.to_string(),
        stem: stem.to_string(),
        options: OptionLabel::ALL
            .into_iter()
            .map(|label| AnswerOption {
                label,
                text: format!("{} option {}", id, label),
            })
            .collect(),
        correct: Some(OptionLabel::A),
        explanation: Some(format!("because {}", id)),
    }
}

#[derive(Default)]
pub(crate) struct MockBackend {
    pub questions: Vec<Question>,
    pub unauthorized_fetch: bool,
    pub unauthorized_answers: bool,
    pub answer_delay: Option<Duration>,
    pub fail_reports: bool,
    pub fetch_calls: AtomicUsize,
    pub answers: Mutex<Vec<(String, String, String)>>,
    /// 请求完整结束（延迟之后）的题目 ID
    pub completed: Mutex<Vec<String>>,
    pub reports: Mutex<Vec<(String, ProctorEvent)>>,
}

impl MockBackend {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn unauthorized_error(endpoint: &str) -> ApiError {
        ApiError::Unauthorized {
            endpoint: endpoint.to_string(),
            message: Some("Unauthenticated.".to_string()),
        }
    }
}

#[async_trait]
impl ExamBackend for MockBackend {
    async fn fetch_questions(&self, _exam_id: &str) -> Result<Vec<Question>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.unauthorized_fetch {
            return Err(Self::unauthorized_error("/question"));
        }
        Ok(self.questions.clone())
    }

    async fn submit_answer(
        &self,
        exam_id: &str,
        question_id: &str,
        selected_option: &str,
    ) -> Result<bool, ApiError> {
        self.answers.lock().unwrap().push((
            exam_id.to_string(),
            question_id.to_string(),
            selected_option.to_string(),
        ));
        if let Some(delay) = self.answer_delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().unwrap().push(question_id.to_string());
        if self.unauthorized_answers {
            return Err(Self::unauthorized_error("/answers"));
        }

        let correct = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .and_then(|q| q.correct_option())
            .map(|o| o.text == selected_option)
            .unwrap_or(false);
        Ok(correct)
    }

    async fn report_cheat(&self, exam_id: &str, event: ProctorEvent) -> Result<(), ApiError> {
        self.reports
            .lock()
            .unwrap()
            .push((exam_id.to_string(), event));
        if self.fail_reports {
            Err(ApiError::EmptyResponse {
                endpoint: "/cheat".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
