//! # Exam Portal
//!
//! 在线考试门户的终端客户端：登录、查看考试、限时答题（带监考信号）、查看成绩。
//! 评分、题库和次数限制都在服务端，客户端只负责状态流转和转发。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有进程级资源，只暴露能力
//! - `SessionStore` - 本地持久化的键值状态（令牌、时长、剩余时间、品牌）
//! - `ApiGateway` - HTTP 中间件管线（附加令牌、401 强制登出）
//! - `Navigator` - 路由信号
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `question_deck` - 题干去重与打乱
//! - `Countdown` - 可恢复的倒计时
//! - `ProctorMonitor` / `ProctorGuard` - 监考上报与监听器生命周期
//! - `NavigationGuard` - 答题期间的离开保护
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的完整答题流程
//! - `SessionCtx` - 上下文封装（exam_id + 时长）
//! - `ExamSession` - 状态机（Initializing → Active → AnswerSubmitted → Finished）
//! - `SessionRunner` - 把计时、监考、提交接到同一个 select 循环
//!
//! ### ④ 编排层（Orchestration）
//! - `views/` - 登录页、考试首页、成绩页
//! - `orchestrator/app` - 路由分发与终端交互
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod views;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ExamBackend, ExamClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ApiGateway, Navigator, Route, SessionStore};
pub use models::{ExamResult, ExamSummary, Question};
pub use orchestrator::App;
pub use workflow::{ExamSession, SessionCtx, SessionRunner};
