//! 应用主循环 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：打开会话存储、创建网关和导航器
//! 2. **路由分发**：按当前路由进入对应的视图
//! 3. **资源管理**：唯一持有终端输入和 HTTP 客户端
//!
//! 视图之间只通过 `Navigator` 跳转；网关遇到 401 时也会把路由切回登录页，
//! 所以主循环每一轮都重新读取当前路由。
//!
//! Ctrl+C：答题页转成离开提示，其他页面直接退出。

use crate::clients::{ExamBackend, ExamClient};
use crate::config::Config;
use crate::infrastructure::{ApiGateway, Navigator, Route, SessionStore};
use crate::orchestrator::terminal::{self, Terminal};
use crate::services::ProctorSource;
use crate::utils::logging::log_startup;
use crate::views::catalog::EXAM_NOT_FOUND;
use crate::views::{logout, CatalogState, CatalogView, LoginView, ResultState, ResultView};
use crate::workflow::{SessionCommand, SessionCtx, SessionEvent, SessionOutcome, SessionRunner};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 一屏处理完后的去向
enum Flow {
    Continue,
    Quit,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<SessionStore>,
    client: Arc<ExamClient>,
    navigator: Navigator,
    terminal: Terminal,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let store = Arc::new(
            SessionStore::open(&config.store_path)
                .with_context(|| format!("无法打开会话存储 {}", config.store_path))?,
        );

        let initial = if store.is_authenticated() {
            Route::Exam
        } else {
            Route::Login
        };
        let navigator = Navigator::new(initial);

        let gateway = ApiGateway::new(&config, store.clone(), navigator.clone())
            .context("创建 HTTP 客户端失败")?;
        let client = Arc::new(ExamClient::new(gateway));

        Ok(Self {
            config,
            store,
            client,
            navigator,
            terminal: Terminal::stdin(),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        loop {
            let route = self.navigator.current();
            if route.requires_auth() && !self.store.is_authenticated() {
                info!("未登录，跳转到登录页");
                self.navigator.redirect_to_login();
                continue;
            }

            info!("📍 {}", route);
            let flow = if interrupt_quits(&route) {
                tokio::select! {
                    flow = self.screen(route) => flow?,
                    _ = tokio::signal::ctrl_c() => {
                        self.terminal.print("");
                        Flow::Quit
                    }
                }
            } else {
                self.screen(route).await?
            };

            if let Flow::Quit = flow {
                info!("👋 退出");
                return Ok(());
            }
        }
    }

    /// 按路由进入对应页面
    async fn screen(&mut self, route: Route) -> Result<Flow> {
        match route {
            Route::Login => self.login_screen().await,
            Route::Exam => self.catalog_screen().await,
            Route::ExamResult { user_exam_id } => self.result_screen(user_exam_id).await,
            Route::ExamQuestions { exam_id } => self.session_screen(exam_id).await,
        }
    }

    async fn login_screen(&mut self) -> Result<Flow> {
        let mut view = LoginView::new(&self.store);
        view.load_branding(&self.client, &self.store).await;
        self.terminal.print(&terminal::render_banner(view.branding()));

        loop {
            let Some(email) = self.terminal.prompt("Email: ").await else {
                return Ok(Flow::Quit);
            };
            let Some(password) = self.terminal.prompt_secret("Password: ").await else {
                return Ok(Flow::Quit);
            };

            if view
                .submit(&self.client, &self.store, &self.navigator, &email, &password)
                .await
            {
                return Ok(Flow::Continue);
            }
            if let Some(message) = view.error() {
                self.terminal.print(message);
            }
        }
    }

    async fn catalog_screen(&mut self) -> Result<Flow> {
        let mut view = CatalogView::new();
        self.terminal.print("Loading exam details...");

        match view.load(&self.client, &self.store, &self.navigator).await {
            CatalogState::Ready { exam, .. } => {
                self.terminal.print(&terminal::render_exam(exam));
            }
            CatalogState::NotFound => {
                self.terminal.print(EXAM_NOT_FOUND);
                return self.logout_or_quit().await;
            }
            CatalogState::RedirectLogin | CatalogState::Loading => return Ok(Flow::Continue),
        }

        loop {
            let Some(choice) = self
                .terminal
                .prompt("[s] Start Exam  [l] Logout  [q] Quit: ")
                .await
            else {
                return Ok(Flow::Quit);
            };

            match choice.to_ascii_lowercase().as_str() {
                "s" => {
                    view.request_start();
                    if let Some(instructions) = view.instructions() {
                        self.terminal.print(&terminal::render_instructions(instructions));
                    }
                    let answer = self.terminal.prompt("[y] Yes, Start Now  [c] Cancel: ").await;
                    match answer.as_deref() {
                        Some("y") | Some("Y") => {
                            if view.confirm_start(&self.navigator).is_some() {
                                return Ok(Flow::Continue);
                            }
                        }
                        Some(_) => view.cancel_start(),
                        None => return Ok(Flow::Quit),
                    }
                }
                "l" => {
                    view.logout(&self.client, &self.store, &self.navigator).await;
                    return Ok(Flow::Continue);
                }
                "q" => return Ok(Flow::Quit),
                _ => {}
            }
        }
    }

    async fn session_screen(&mut self, exam_id: String) -> Result<Flow> {
        let ctx = SessionCtx::from_store(exam_id, &self.store);
        let backend: Arc<dyn ExamBackend> = self.client.clone();
        let runner = SessionRunner::new(
            backend,
            self.store.clone(),
            self.navigator.clone(),
            self.config.tick_interval(),
        )
        .with_sources(proctor_sources());

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut handle = tokio::spawn(runner.run(ctx, cmd_rx, event_tx));
        let mut commands = Some(cmd_tx);

        // 整个答题期间只注册一个 Ctrl+C 监听，触发后重新挂上
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut interrupt_armed = true;

        let outcome = loop {
            tokio::select! {
                outcome = &mut handle => {
                    break outcome.context("答题任务异常退出")?;
                }

                Some(event) = event_rx.recv() => {
                    if let Some(text) = terminal::render_event(&event) {
                        self.terminal.print(&text);
                    }
                }

                line = self.terminal.next_line(), if commands.is_some() => {
                    let Some(line) = line else {
                        // 输入结束：关闭命令通道，会话保留剩余时间后退出
                        commands = None;
                        continue;
                    };
                    match (terminal::parse_command(&line), commands.as_ref()) {
                        (Some(command), Some(tx)) => {
                            if tx.send(command).await.is_err() {
                                warn!("答题任务已结束，忽略输入");
                            }
                        }
                        (None, _) if !line.is_empty() => {
                            self.terminal.print("Unknown command.");
                        }
                        _ => {}
                    }
                }

                signal = &mut interrupt, if interrupt_armed => {
                    match signal {
                        Ok(()) => {
                            interrupt.set(tokio::signal::ctrl_c());
                            if let Some(tx) = commands.as_ref() {
                                let _ = tx.send(SessionCommand::Leave).await;
                            }
                        }
                        Err(e) => {
                            warn!("无法监听 Ctrl+C: {}", e);
                            interrupt_armed = false;
                        }
                    }
                }
            }
        };

        while let Ok(event) = event_rx.try_recv() {
            if let Some(text) = terminal::render_event(&event) {
                self.terminal.print(&text);
            }
        }

        match outcome {
            SessionOutcome::Finished { .. } | SessionOutcome::LoggedOut => Ok(Flow::Continue),
            SessionOutcome::Unavailable => self.logout_or_quit().await,
            SessionOutcome::Abandoned => Ok(Flow::Quit),
        }
    }

    async fn result_screen(&mut self, user_exam_id: String) -> Result<Flow> {
        let mut view = ResultView::new(user_exam_id);
        self.terminal.print("Loading results...");

        if let ResultState::Loaded(result) = view.load(&self.client, &self.store).await {
            self.terminal.print(&terminal::render_result(result));
        }

        loop {
            let label = if view.can_retake() {
                "[r] Retake Exam  [l] Logout  [q] Quit: "
            } else {
                "[l] Logout  [q] Quit: "
            };
            let Some(choice) = self.terminal.prompt(label).await else {
                return Ok(Flow::Quit);
            };

            match choice.to_ascii_lowercase().as_str() {
                "r" if view.can_retake() => {
                    if self.confirm("Do you want to retake the exam? [y/N]: ").await
                        && view.retake(&self.navigator)
                    {
                        return Ok(Flow::Continue);
                    }
                }
                "l" => {
                    if self.confirm("Are you sure you want to log out? [y/N]: ").await {
                        view.logout(&self.client, &self.store, &self.navigator).await;
                        return Ok(Flow::Continue);
                    }
                }
                "q" => return Ok(Flow::Quit),
                _ => {}
            }
        }
    }

    /// 只剩登出可选的终止页
    async fn logout_or_quit(&mut self) -> Result<Flow> {
        loop {
            let Some(choice) = self.terminal.prompt("[l] Logout  [q] Quit: ").await else {
                return Ok(Flow::Quit);
            };
            match choice.to_ascii_lowercase().as_str() {
                "l" => {
                    logout(&self.client, &self.store, &self.navigator).await;
                    return Ok(Flow::Continue);
                }
                "q" => return Ok(Flow::Quit),
                _ => {}
            }
        }
    }

    async fn confirm(&mut self, label: &str) -> bool {
        matches!(
            self.terminal.prompt(label).await.as_deref(),
            Some("y") | Some("Y")
        )
    }
}

/// 答题页自己处理 Ctrl+C（转成离开提示），其他页面直接退出
fn interrupt_quits(route: &Route) -> bool {
    !matches!(route, Route::ExamQuestions { .. })
}

/// 当前平台可用的监考来源
fn proctor_sources() -> Vec<Box<dyn ProctorSource>> {
    #[allow(unused_mut)]
    let mut sources: Vec<Box<dyn ProctorSource>> = Vec::new();
    #[cfg(unix)]
    sources.push(Box::new(crate::services::proctor_monitor::WindowResizeSource));
    #[cfg(target_os = "linux")]
    sources.push(Box::new(
        crate::services::proctor_monitor::ResumeFromBackgroundSource,
    ));
    sources
}
