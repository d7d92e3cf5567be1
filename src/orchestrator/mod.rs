//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个客户端的"指挥中心"，负责路由分发和终端交互。
//!
//! ## 模块划分
//!
//! ### `app` - 应用主循环
//! - 管理应用生命周期（初始化、运行）
//! - 按当前路由进入登录页 / 考试首页 / 答题页 / 成绩页
//! - 持有会话存储、HTTP 客户端和导航器
//!
//! ### `terminal` - 终端宿主
//! - 后台读取标准输入
//! - 把视图状态和答题事件渲染成文字
//!
//! ## 层次关系
//!
//! ```text
//! app (路由分发)
//!     ↓
//! views (登录 / 首页 / 成绩) + workflow::SessionRunner (答题)
//!     ↓
//! services (能力层：题目整理 / 计时 / 监考 / 离开保护)
//!     ↓
//! infrastructure (基础设施：SessionStore / ApiGateway / Navigator)
//! ```

pub mod app;
pub mod terminal;

// 重新导出主要类型
pub use app::App;
pub use terminal::Terminal;
