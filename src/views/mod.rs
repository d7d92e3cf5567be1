//! 视图层
//!
//! 每个视图只持有自己的临时状态，离开即丢弃；共享状态都在 `SessionStore` 里。

pub mod catalog;
pub mod login;
pub mod result;

pub use catalog::{CatalogState, CatalogView};
pub use login::{login_error_message, LoginView};
pub use result::{ResultState, ResultView};

use crate::clients::ExamClient;
use crate::infrastructure::{Navigator, SessionStore};
use tracing::{error, info, warn};

/// 登出：服务端请求尽力而为，本地令牌无论如何都清除
pub async fn logout(client: &ExamClient, store: &SessionStore, navigator: &Navigator) {
    if let Err(e) = client.logout().await {
        warn!("登出请求失败（忽略）: {}", e);
    }
    if let Err(e) = store.clear_auth_token() {
        error!("清除令牌失败: {}", e);
    }
    info!("👋 已登出");
    navigator.redirect_to_login();
}
