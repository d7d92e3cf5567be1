//! 答题会话运行器 - 流程层
//!
//! 把状态机接到三个相互独立的异步来源上：
//! 1. 每秒一次的计时 tick
//! 2. 监考信号
//! 3. 用户命令与正在进行的答案提交
//!
//! 三者在同一个 `tokio::select!` 循环里推进，任何一个都不会阻塞另外两个；
//! 提交中的请求不会暂停计时，时间到了也不等待请求返回。
//! 答案提交在独立任务里完成，会话结束只丢弃结果，不取消请求。

use crate::clients::ExamBackend;
use crate::error::{ApiError, AppError, SessionError};
use crate::infrastructure::{Navigator, Route, SessionStore};
use crate::models::{AnswerOption, OptionLabel, ProctorEvent};
use crate::services::{
    BackDecision, NavigationGuard, ProctorGuard, ProctorMonitor, ProctorSource, LEAVE_WARNING,
};
use crate::workflow::exam_session::{Advance, ExamSession, FinishReason};
use crate::workflow::session_ctx::SessionCtx;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const NO_QUESTIONS_MESSAGE: &str = "⚠ No questions found.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit answer. Please try again.";

/// 用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Select(OptionLabel),
    Submit,
    Next,
    /// 后退
    Back,
    /// 按键（用于拦截刷新快捷键）
    Key { key: String, ctrl: bool },
    /// 尝试离开（终端里的 Ctrl+C）
    Leave,
}

/// 运行器发给界面的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 显示一道题
    Question {
        progress: String,
        stem: String,
        options: Vec<AnswerOption>,
        time_left: u64,
    },
    Tick(u64),
    Selected(OptionLabel),
    Submitting,
    Feedback { headline: String, explanation: String },
    /// 本地拒绝的操作
    Rejected(String),
    /// 导航保护给出的提示
    Warning(String),
    ProctorWarning { count: u32, event: ProctorEvent },
    /// 无法开始答题
    Unavailable(String),
    SessionExpired,
    Finished { reason: FinishReason, route: Route },
}

/// 会话运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished { reason: FinishReason, route: Route },
    Unavailable,
    /// 令牌失效，已回到登录页
    LoggedOut,
    /// 命令通道关闭（宿主退出），剩余时间保留以便恢复
    Abandoned,
}

type InFlight = JoinHandle<(String, Result<bool, ApiError>)>;

/// 答题会话运行器
pub struct SessionRunner {
    backend: Arc<dyn ExamBackend>,
    store: Arc<SessionStore>,
    navigator: Navigator,
    tick_interval: Duration,
    sources: Vec<Box<dyn ProctorSource>>,
}

impl SessionRunner {
    pub fn new(
        backend: Arc<dyn ExamBackend>,
        store: Arc<SessionStore>,
        navigator: Navigator,
        tick_interval: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            navigator,
            tick_interval,
            sources: Vec::new(),
        }
    }

    /// 会话期间挂载的监考来源
    pub fn with_sources(mut self, sources: Vec<Box<dyn ProctorSource>>) -> Self {
        self.sources = sources;
        self
    }

    pub async fn run(
        self,
        ctx: SessionCtx,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> SessionOutcome {
        let emit = |event: SessionEvent| {
            if events.send(event).is_err() {
                debug!("界面已关闭，丢弃事件");
            }
        };

        let SessionRunner {
            backend,
            store,
            navigator,
            tick_interval,
            sources,
        } = self;

        let mut session = ExamSession::new(ctx.clone());
        let mut rng = StdRng::from_entropy();

        if let Err(e) = session
            .initialize(backend.as_ref(), &store, &mut rng)
            .await
        {
            return match e {
                AppError::Api(api) if api.is_unauthorized() => {
                    force_logout(&store, &navigator);
                    emit(SessionEvent::SessionExpired);
                    SessionOutcome::LoggedOut
                }
                AppError::Session(SessionError::NoQuestions) => {
                    emit(SessionEvent::Unavailable(NO_QUESTIONS_MESSAGE.to_string()));
                    SessionOutcome::Unavailable
                }
                other => {
                    error!("{} 无法开始答题: {}", ctx, other);
                    emit(SessionEvent::Unavailable(NO_QUESTIONS_MESSAGE.to_string()));
                    SessionOutcome::Unavailable
                }
            };
        }

        // 会话期间的作用域资源：任何 return 都会卸载
        let mut nav_guard = NavigationGuard::engage(navigator.clone(), ctx.questions_route());
        let (proctor_tx, mut proctor_rx) = mpsc::unbounded_channel();
        let proctor_guard = ProctorGuard::attach(sources, proctor_tx);
        let monitor = ProctorMonitor::new(backend.clone(), ctx.exam_id.clone());
        // 其他请求（例如监考上报）遇到 401 时网关会切回登录页
        let mut routes = navigator.subscribe();
        info!("🛡 {} 已挂载 {} 个监考来源", ctx, proctor_guard.len());

        emit(question_event(&session));

        let mut ticker = tokio::time::interval(tick_interval);
        ticker.tick().await;
        let mut in_flight: Option<InFlight> = None;

        let (reason, route) = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match session.tick(&store) {
                        Some(route) => {
                            let reason = session.finish_reason().unwrap_or(FinishReason::TimeUp);
                            break (reason, route);
                        }
                        None => emit(SessionEvent::Tick(session.time_left())),
                    }
                }

                Ok(()) = routes.changed() => {
                    if *routes.borrow_and_update() == Route::Login {
                        warn!("{} 会话已在别处失效，结束答题", ctx);
                        emit(SessionEvent::SessionExpired);
                        return SessionOutcome::LoggedOut;
                    }
                }

                Some(event) = proctor_rx.recv() => {
                    let (count, _report) = monitor.report(event);
                    emit(SessionEvent::ProctorWarning { count, event });
                }

                joined = async {
                    match in_flight.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    let (question_id, result) = match joined {
                        Ok(done) => done,
                        Err(e) => {
                            error!("{} 提交任务异常结束: {}", ctx, e);
                            if let Some(id) = session.current_question().map(|q| q.id.clone()) {
                                session.abort_submission(&id);
                            }
                            emit(SessionEvent::Rejected(SUBMIT_FAILED_MESSAGE.to_string()));
                            continue;
                        }
                    };
                    match result {
                        Ok(is_correct) => {
                            if session.apply_verdict(&question_id, is_correct) {
                                if let Some(feedback) = session.feedback() {
                                    emit(SessionEvent::Feedback {
                                        headline: feedback.headline(),
                                        explanation: feedback.explanation.clone(),
                                    });
                                }
                            }
                        }
                        Err(e) if e.is_unauthorized() => {
                            warn!("{} 提交答案时令牌失效", ctx);
                            force_logout(&store, &navigator);
                            emit(SessionEvent::SessionExpired);
                            return SessionOutcome::LoggedOut;
                        }
                        Err(e) => {
                            error!("{} 提交答案失败: {}", ctx, e);
                            session.abort_submission(&question_id);
                            emit(SessionEvent::Rejected(SUBMIT_FAILED_MESSAGE.to_string()));
                        }
                    }
                }

                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("{} 命令通道关闭，保留剩余时间 {} 秒", ctx, session.time_left());
                        return SessionOutcome::Abandoned;
                    };

                    match command {
                        SessionCommand::Select(label) => match session.select(label) {
                            Ok(()) => emit(SessionEvent::Selected(label)),
                            Err(e) => emit(SessionEvent::Rejected(rejection_message(&e))),
                        },
                        SessionCommand::Submit => match session.begin_submission() {
                            Ok(pending) => {
                                let backend = backend.clone();
                                in_flight = Some(tokio::spawn(async move {
                                    let result = backend
                                        .submit_answer(
                                            &pending.exam_id,
                                            &pending.question_id,
                                            &pending.selected_option,
                                        )
                                        .await;
                                    (pending.question_id, result)
                                }));
                                emit(SessionEvent::Submitting);
                            }
                            Err(e) => emit(SessionEvent::Rejected(rejection_message(&e))),
                        },
                        SessionCommand::Next => match session.advance(&store) {
                            Ok(Advance::Next(_)) => emit(question_event(&session)),
                            Ok(Advance::Finished(route)) => {
                                break (FinishReason::Completed, route);
                            }
                            Err(e) => emit(SessionEvent::Rejected(rejection_message(&e))),
                        },
                        SessionCommand::Back => match nav_guard.on_back() {
                            BackDecision::Suppressed => {
                                emit(SessionEvent::Warning(LEAVE_WARNING.to_string()));
                            }
                            BackDecision::Allowed => debug!("导航保护已解除，允许后退"),
                        },
                        SessionCommand::Key { key, ctrl } => {
                            if nav_guard.intercepts_key(&key, ctrl) {
                                debug!("拦截刷新按键: {}", key);
                                emit(SessionEvent::Warning(LEAVE_WARNING.to_string()));
                            }
                        }
                        SessionCommand::Leave => {
                            if let Some(warning) = nav_guard.on_leave() {
                                emit(SessionEvent::Warning(warning.to_string()));
                            }
                        }
                    }
                }
            }
        };

        nav_guard.lift();
        proctor_guard.detach();
        info!(
            "{} 共 {} 次监考警告，跳转到 {}",
            ctx,
            monitor.warnings(),
            route
        );
        navigator.navigate(route.clone());
        emit(SessionEvent::Finished {
            reason,
            route: route.clone(),
        });

        SessionOutcome::Finished { reason, route }
    }

}

/// 令牌失效：清除会话状态并回到登录页
fn force_logout(store: &SessionStore, navigator: &Navigator) {
    if let Err(e) = store.clear_session_state() {
        error!("清除会话状态失败: {}", e);
    }
    navigator.redirect_to_login();
}

fn question_event(session: &ExamSession) -> SessionEvent {
    let (stem, options) = session
        .current_question()
        .map(|q| (q.stem.clone(), q.options.clone()))
        .unwrap_or_default();

    SessionEvent::Question {
        progress: session.progress(),
        stem,
        options,
        time_left: session.time_left(),
    }
}

/// 本地拒绝时给用户看的文字
pub fn rejection_message(err: &SessionError) -> String {
    match err {
        SessionError::NoSelection => "Please select an option.".to_string(),
        SessionError::AnswerLocked => {
            "Answer already submitted. Press next to continue.".to_string()
        }
        SessionError::SubmissionInFlight => "Submitting answer, please wait.".to_string(),
        SessionError::UnknownOption { label } => format!("Unknown option: {}", label),
        other => other.to_string(),
    }
}
