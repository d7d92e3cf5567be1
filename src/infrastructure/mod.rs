//! 基础设施层
//!
//! 持有进程级资源（本地存储、HTTP 客户端、导航信号），只暴露能力，不认识考试流程。

pub mod gateway;
pub mod navigator;
pub mod session_store;

pub use gateway::{ApiGateway, BearerAuth, ForcedLogout, GatewayLayer};
pub use navigator::{Navigator, Route};
pub use session_store::SessionStore;
