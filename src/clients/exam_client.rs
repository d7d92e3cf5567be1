/// 考试 API 客户端
///
/// 封装所有与考试服务相关的调用；令牌与 401 处理由网关统一完成。
use crate::error::ApiError;
use crate::infrastructure::ApiGateway;
use crate::models::{
    ApiEnvelope, AnswerVerdict, Branding, BrandingPayload, CheatReport, ExamResult, ExamSummary,
    MaybeWrapped, ProctorEvent, Question, QuestionItem,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// 答题会话依赖的服务端能力
///
/// 会话引擎只认识这个 trait，便于在测试中替换。
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// 拉取题目（原始顺序）
    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, ApiError>;

    /// 提交答案，返回是否正确
    async fn submit_answer(
        &self,
        exam_id: &str,
        question_id: &str,
        selected_option: &str,
    ) -> Result<bool, ApiError>;

    /// 上报监考事件
    async fn report_cheat(&self, exam_id: &str, event: ProctorEvent) -> Result<(), ApiError>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenData {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    question_id: &'a str,
    selected_option: &'a str,
}

/// 考试 API 客户端
pub struct ExamClient {
    gateway: ApiGateway,
}

impl ExamClient {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// 登录
    ///
    /// # 返回
    /// 响应中带令牌时返回 `Some(token)`，否则 `None`
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>, ApiError> {
        debug!("登录: {}", email);
        let response: LoginResponse = self
            .gateway
            .post_json("/login", &LoginRequest { email, password })
            .await?;

        let token = response
            .token
            .or_else(|| response.data.and_then(|d| d.token))
            .filter(|t| !t.is_empty());
        Ok(token)
    }

    /// 登出（尽力而为，调用方无论结果都要清除本地令牌）
    pub async fn logout(&self) -> Result<(), ApiError> {
        match self.gateway.post_json::<_, Value>("/logout", &json!({})).await {
            Ok(_) | Err(ApiError::EmptyResponse { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// 门户品牌信息（无需登录）
    pub async fn fetch_branding(&self) -> Result<Branding, ApiError> {
        let envelope: ApiEnvelope<BrandingPayload> =
            self.gateway.get_json("/settings/logo").await?;
        let payload = envelope.into_data().unwrap_or_default();

        let logo_url = payload
            .logo
            .filter(|l| !l.is_empty())
            .map(|logo| format!("{}{}", self.gateway.asset_origin(), logo));

        Ok(Branding {
            logo_url,
            app_name: payload.app_name.filter(|n| !n.is_empty()),
        })
    }

    /// 当前有效考试（列表第一项）；没有考试时返回 `None`
    pub async fn fetch_exam_summary(&self) -> Result<Option<ExamSummary>, ApiError> {
        let envelope: ApiEnvelope<Vec<ExamSummary>> = self.gateway.get_json("/exam/detail").await?;
        Ok(envelope.data.and_then(|exams| exams.into_iter().next()))
    }

    /// 成绩（不缓存）
    pub async fn fetch_result(&self, user_exam_id: &str) -> Result<ExamResult, ApiError> {
        let endpoint = format!("/exam/{}/result", user_exam_id);
        let payload: MaybeWrapped<ExamResult> = self.gateway.get_json(&endpoint).await?;
        payload
            .into_inner()
            .ok_or(ApiError::EmptyResponse { endpoint })
    }
}

#[async_trait]
impl ExamBackend for ExamClient {
    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, ApiError> {
        let endpoint = format!("/exam/{}/question", exam_id);
        let envelope: ApiEnvelope<Vec<QuestionItem>> = self.gateway.get_json(&endpoint).await?;

        let items = envelope.into_data().unwrap_or_default();
        info!("📥 拉取到 {} 道题目", items.len());
        Ok(items.into_iter().map(Question::from).collect())
    }

    async fn submit_answer(
        &self,
        exam_id: &str,
        question_id: &str,
        selected_option: &str,
    ) -> Result<bool, ApiError> {
        let endpoint = format!("/exams/{}/answers", exam_id);
        let payload: MaybeWrapped<AnswerVerdict> = self
            .gateway
            .post_json(
                &endpoint,
                &AnswerRequest {
                    question_id,
                    selected_option,
                },
            )
            .await?;

        payload
            .into_inner()
            .map(|v| v.is_correct)
            .ok_or(ApiError::EmptyResponse { endpoint })
    }

    async fn report_cheat(&self, exam_id: &str, event: ProctorEvent) -> Result<(), ApiError> {
        let endpoint = format!("/exam/{}/cheat", exam_id);
        match self
            .gateway
            .post_json::<_, Value>(&endpoint, &CheatReport::from(&event))
            .await
        {
            Ok(_) | Err(ApiError::EmptyResponse { .. }) => {
                warn!("⚠ 已上报监考事件: {}", event);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
