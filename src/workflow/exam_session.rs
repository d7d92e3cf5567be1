//! 答题会话状态机 - 流程层
//!
//! 核心职责：定义"一场考试"的完整答题流程
//!
//! 阶段流转：
//! 1. Initializing → Active（拉题、去重、打乱、启动计时，只发生一次）
//! 2. Active → AnswerSubmitted（必须先选择；服务端判定后显示反馈）
//! 3. AnswerSubmitted → Active（下一题）或 Finished（最后一题 / 时间到）
//! 4. 题目为空时进入 Unavailable，不计时，只能离开
//!
//! 状态机本身不做任何网络调用以外的 IO，提交由调用方异步执行，
//! 结果通过 `apply_verdict` 回填；过期的判定会被忽略。

use crate::clients::ExamBackend;
use crate::error::{AppResult, SessionError};
use crate::infrastructure::{Route, SessionStore};
use crate::models::{AnswerOption, OptionLabel, Question};
use crate::services::{prepare_deck, Countdown, Tick};
use crate::utils::truncate_text;
use crate::workflow::session_ctx::SessionCtx;
use rand::Rng;
use std::fmt;
use tracing::{debug, error, info, warn};

/// 没有解析时显示的文字
pub const NO_EXPLANATION: &str = "No explanation available.";

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Active,
    AnswerSubmitted,
    Finished,
    /// 没有题目，无法开始
    Unavailable,
}

impl SessionPhase {
    /// 计时和监考是否生效
    pub fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::AnswerSubmitted)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Initializing => "Initializing",
            SessionPhase::Active => "Active",
            SessionPhase::AnswerSubmitted => "AnswerSubmitted",
            SessionPhase::Finished => "Finished",
            SessionPhase::Unavailable => "Unavailable",
        };
        write!(f, "{}", name)
    }
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// 最后一题之后点击下一题
    Completed,
    /// 倒计时归零
    TimeUp,
}

/// 一道题提交后的反馈
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub is_correct: bool,
    /// 正确选项（标签 + 文本）
    pub correct: Option<AnswerOption>,
    pub explanation: String,
}

impl Feedback {
    pub fn headline(&self) -> String {
        if self.is_correct {
            return "✅ Correct!".to_string();
        }
        match &self.correct {
            Some(option) => format!("❌ Incorrect. Answer: {}. {}", option.label, option.text),
            None => "❌ Incorrect.".to_string(),
        }
    }
}

/// 待提交的答案，由 `begin_submission` 生成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnswer {
    pub exam_id: String,
    pub question_id: String,
    /// 提交的是选项文本而不是标签
    pub selected_option: String,
}

/// 点击"下一题"的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// 进入下一题（从 0 开始的索引）
    Next(usize),
    /// 会话结束，跳转到成绩页
    Finished(Route),
}

/// 答题会话
pub struct ExamSession {
    ctx: SessionCtx,
    phase: SessionPhase,
    questions: Vec<Question>,
    current: usize,
    selected: Option<OptionLabel>,
    feedback: Option<Feedback>,
    submitting: bool,
    countdown: Option<Countdown>,
    finish_reason: Option<FinishReason>,
}

impl ExamSession {
    pub fn new(ctx: SessionCtx) -> Self {
        Self {
            ctx,
            phase: SessionPhase::Initializing,
            questions: Vec::new(),
            current: 0,
            selected: None,
            feedback: None,
            submitting: false,
            countdown: None,
            finish_reason: None,
        }
    }

    /// 拉题并开始会话
    ///
    /// 只能在 `Initializing` 阶段调用一次；再次调用直接报错，不会重新拉题或打乱。
    /// 拉题失败或题目为空时进入 `Unavailable`。
    pub async fn initialize<R: Rng + ?Sized>(
        &mut self,
        backend: &dyn ExamBackend,
        store: &SessionStore,
        rng: &mut R,
    ) -> AppResult<SessionPhase> {
        if self.phase != SessionPhase::Initializing {
            return Err(SessionError::AlreadyInitialized {
                phase: self.phase.to_string(),
            }
            .into());
        }

        info!("📚 {} 开始拉取题目", self.ctx);
        let fetched = match backend.fetch_questions(&self.ctx.exam_id).await {
            Ok(questions) => questions,
            Err(e) => {
                error!("{} 拉取题目失败: {}", self.ctx, e);
                self.phase = SessionPhase::Unavailable;
                return Err(e.into());
            }
        };

        let deck = prepare_deck(fetched, rng);
        if deck.is_empty() {
            warn!("⚠ {} 没有找到题目", self.ctx);
            self.phase = SessionPhase::Unavailable;
            return Err(SessionError::NoQuestions.into());
        }

        self.countdown = Some(Countdown::resume_or_start(store, self.ctx.duration_minutes)?);
        self.questions = deck;
        self.phase = SessionPhase::Active;
        info!("✓ {} 会话开始，共 {} 题", self.ctx, self.questions.len());

        Ok(self.phase)
    }

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn selected(&self) -> Option<OptionLabel> {
        self.selected
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// 剩余秒数（未计时为 0）
    pub fn time_left(&self) -> u64 {
        self.countdown.as_ref().map(|c| c.remaining()).unwrap_or(0)
    }

    /// 进度，例如 `Q 2 of 4`
    pub fn progress(&self) -> String {
        format!("Q {} of {}", self.current + 1, self.questions.len())
    }

    /// 选择一个选项
    pub fn select(&mut self, label: OptionLabel) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::AnswerSubmitted => return Err(SessionError::AnswerLocked),
            phase => return Err(SessionError::invalid_phase(phase, "select")),
        }
        if self.submitting {
            return Err(SessionError::SubmissionInFlight);
        }

        let exists = self
            .current_question()
            .map(|q| q.option(label).is_some())
            .unwrap_or(false);
        if !exists {
            return Err(SessionError::UnknownOption {
                label: label.to_string(),
            });
        }

        self.selected = Some(label);
        Ok(())
    }

    /// 开始提交当前题目
    ///
    /// 没有选择时直接拒绝，不会产生网络请求。
    pub fn begin_submission(&mut self) -> Result<PendingAnswer, SessionError> {
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::AnswerSubmitted => return Err(SessionError::AnswerLocked),
            phase => return Err(SessionError::invalid_phase(phase, "submit")),
        }
        if self.submitting {
            return Err(SessionError::SubmissionInFlight);
        }

        let label = self.selected.ok_or(SessionError::NoSelection)?;
        let question = self
            .current_question()
            .ok_or_else(|| SessionError::invalid_phase(self.phase, "submit"))?;
        let option = question
            .option(label)
            .ok_or_else(|| SessionError::UnknownOption {
                label: label.to_string(),
            })?;

        let pending = PendingAnswer {
            exam_id: self.ctx.exam_id.clone(),
            question_id: question.id.clone(),
            selected_option: option.text.clone(),
        };
        debug!(
            "提交第 {} 题 {}: {}",
            self.current + 1,
            pending.question_id,
            truncate_text(&question.stem, 40)
        );
        self.submitting = true;
        Ok(pending)
    }

    /// 回填服务端判定
    ///
    /// # 返回
    /// 判定属于当前正在提交的题目时返回 true；过期的判定返回 false 并被忽略
    pub fn apply_verdict(&mut self, question_id: &str, is_correct: bool) -> bool {
        if !self.accepts_response_for(question_id) {
            debug!("忽略过期的判定: {}", question_id);
            return false;
        }

        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        let feedback = Feedback {
            is_correct,
            correct: question.correct_option().cloned(),
            explanation: question
                .explanation
                .clone()
                .unwrap_or_else(|| NO_EXPLANATION.to_string()),
        };

        info!(
            "{} 第 {} 题: {}",
            self.ctx,
            self.current + 1,
            if is_correct { "✓ 正确" } else { "✗ 错误" }
        );
        self.feedback = Some(feedback);
        self.submitting = false;
        self.phase = SessionPhase::AnswerSubmitted;
        true
    }

    /// 提交失败，允许用户重新提交
    pub fn abort_submission(&mut self, question_id: &str) {
        if self.accepts_response_for(question_id) {
            self.submitting = false;
        }
    }

    fn accepts_response_for(&self, question_id: &str) -> bool {
        self.phase == SessionPhase::Active
            && self.submitting
            && self
                .current_question()
                .map(|q| q.id == question_id)
                .unwrap_or(false)
    }

    /// 下一题；最后一题之后结束会话
    pub fn advance(&mut self, store: &SessionStore) -> Result<Advance, SessionError> {
        if self.phase != SessionPhase::AnswerSubmitted {
            return Err(SessionError::invalid_phase(self.phase, "next"));
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.feedback = None;
            self.phase = SessionPhase::Active;
            return Ok(Advance::Next(self.current));
        }

        self.finish(FinishReason::Completed, store)
            .map(Advance::Finished)
            .ok_or_else(|| SessionError::invalid_phase(self.phase, "next"))
    }

    /// 倒计时走一秒；归零时强制结束，返回成绩页路由
    pub fn tick(&mut self, store: &SessionStore) -> Option<Route> {
        if !self.phase.is_live() {
            return None;
        }
        let tick = self.countdown.as_mut()?.tick(store);
        match tick {
            Tick::Expired => {
                info!("⏳ Time is up!");
                self.finish(FinishReason::TimeUp, store)
            }
            Tick::Running(_) | Tick::Idle => None,
        }
    }

    /// 结束会话，只生效一次
    ///
    /// 清除持久化的剩余时间，返回成绩页路由；已经结束或尚未开始时返回 None。
    pub fn finish(&mut self, reason: FinishReason, store: &SessionStore) -> Option<Route> {
        if !self.phase.is_live() {
            return None;
        }

        if let Some(countdown) = self.countdown.as_mut() {
            if let Err(e) = countdown.stop(store) {
                error!("清除剩余时间失败: {}", e);
            }
        }

        self.phase = SessionPhase::Finished;
        self.submitting = false;
        self.finish_reason = Some(reason);
        info!("🎉 {} 考试结束 ({:?})", self.ctx, reason);

        Some(self.ctx.result_route())
    }
}
