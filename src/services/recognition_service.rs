//! 识别服务 - 业务能力层
//!
//! 只负责"从一页图像识别学号姓名"的能力，不关心分组流程

use crate::clients::VisionClient;
use crate::error::RecognitionError;
use crate::infrastructure::PageImageSource;
use crate::models::{PageRef, RecognitionResult};
use crate::utils::logging::truncate_text;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "你是一个帮助识别学号和姓名的助手。如果图片中有学号和姓名，请以 JSON 格式返回；如果没有，则返回 None。";

const USER_PROMPT: &str = "请识别图片中是否有学号和姓名，如果有，请以 JSON 格式返回，格式为：{\"学号\": \"xxx\", \"姓名\": \"xxx\"}；如果没有，则返回 None。";

/// 识别适配器
///
/// "没有找到身份信息"用 `Ok(None)` 表示；调用失败返回 `Err`，
/// 由调用方降级为"未识别"
#[async_trait]
pub trait RecognitionAdapter: Send + Sync {
    async fn recognize(&self, page_image: &[u8]) -> Result<Option<RecognitionResult>>;
}

/// 基于视觉大模型的识别适配器
pub struct VisionRecognizer {
    client: VisionClient,
}

impl VisionRecognizer {
    pub fn new(client: VisionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecognitionAdapter for VisionRecognizer {
    async fn recognize(&self, page_image: &[u8]) -> Result<Option<RecognitionResult>> {
        let response = self
            .client
            .ask_with_image(page_image, USER_PROMPT, Some(SYSTEM_PROMPT))
            .await?;
        debug!("识别模型回复: {}", truncate_text(&response, 120));
        parse_recognition_response(&response)
    }
}

/// 解析模型回复
///
/// - 去掉 Markdown 代码块标记
/// - `None` / `null` / 空回复视为没有身份信息
/// - JSON 解析失败时把单引号换成双引号再试一次
pub fn parse_recognition_response(response: &str) -> Result<Option<RecognitionResult>> {
    let fence = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```")?;
    let body = fence
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim();

    if body.is_empty() || matches!(body, "None" | "none" | "null" | "NULL") {
        return Ok(None);
    }

    // 模型有时会在 JSON 前后附加说明文字
    let object = Regex::new(r"(?s)\{.*\}")?;
    let json = object.find(body).map(|m| m.as_str()).unwrap_or(body);

    let parsed = match serde_json::from_str::<RecognitionResult>(json) {
        Ok(parsed) => parsed,
        Err(first_error) => serde_json::from_str::<RecognitionResult>(&json.replace('\'', "\""))
            .map_err(|_| {
                anyhow::anyhow!(
                    "无法解析识别结果: {} ({})",
                    truncate_text(json, 80),
                    first_error
                )
            })?,
    };

    if parsed.student_id.is_none() && parsed.student_name.is_none() {
        return Ok(None);
    }
    Ok(Some(parsed))
}

/// 页面识别服务
///
/// 组合页面渲染与识别适配器，并为每次调用加上超时
pub struct RecognitionService<'a> {
    images: &'a dyn PageImageSource,
    adapter: &'a dyn RecognitionAdapter,
    timeout: Duration,
}

impl<'a> RecognitionService<'a> {
    pub fn new(
        images: &'a dyn PageImageSource,
        adapter: &'a dyn RecognitionAdapter,
        timeout: Duration,
    ) -> Self {
        Self {
            images,
            adapter,
            timeout,
        }
    }

    /// 识别一页
    ///
    /// # 返回
    /// - `Ok(Some(..))`: 识别到学生信息
    /// - `Ok(None)`: 页面上没有学生信息
    /// - `Err(..)`: 渲染失败、模型调用失败或超时
    pub async fn recognize_page(
        &self,
        page: &PageRef,
    ) -> Result<Option<RecognitionResult>, RecognitionError> {
        let image = self
            .images
            .page_image(page)
            .await
            .map_err(|e| RecognitionError::RenderFailed {
                page_index: page.index,
                source: e.into(),
            })?;

        match tokio::time::timeout(self.timeout, self.adapter.recognize(&image)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(RecognitionError::AdapterFailed { source: e.into() }),
            Err(_) => Err(RecognitionError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_plain_json() {
        let result = parse_recognition_response(r#"{"学号": "1001", "姓名": "张三"}"#).unwrap();
        assert_eq!(result, Some(RecognitionResult::new("1001", "张三")));
    }

    #[test]
    fn test_fenced_json() {
        let response = "```json\n{\"学号\": \"1001\", \"姓名\": \"张三\"}\n```";
        let result = parse_recognition_response(response).unwrap();
        assert_eq!(result, Some(RecognitionResult::new("1001", "张三")));
    }

    #[test]
    fn test_single_quoted_json() {
        let result = parse_recognition_response("{'学号': '1001', '姓名': '张三'}").unwrap();
        assert_eq!(result, Some(RecognitionResult::new("1001", "张三")));
    }

    #[test]
    fn test_json_with_surrounding_text() {
        let response = "识别结果如下：{\"学号\": 20230101, \"姓名\": \"李四\"} 请核对。";
        let result = parse_recognition_response(response).unwrap().unwrap();
        assert_eq!(result.student_id.as_deref(), Some("20230101"));
    }

    #[test]
    fn test_none_reply() {
        assert_eq!(assert_ok!(parse_recognition_response("None")), None);
        assert_eq!(assert_ok!(parse_recognition_response("  ")), None);
        assert_eq!(assert_ok!(parse_recognition_response("```json\nnull\n```")), None);
        assert_eq!(assert_ok!(parse_recognition_response("{}")), None);
    }

    #[test]
    fn test_garbage_reply_is_error() {
        assert_err!(parse_recognition_response("我看不清这张图片"));
        assert_err!(parse_recognition_response(r#"{"学号": ["1001"]}"#));
        assert_err!(parse_recognition_response(r#"["1001","张三"]"#));
        assert_err!(parse_recognition_response("```json\n[\"1001\", \"张三\"]\n```"));
    }

    struct FixedImage;

    #[async_trait]
    impl PageImageSource for FixedImage {
        async fn page_image(&self, page: &PageRef) -> Result<Vec<u8>> {
            Ok(vec![page.index as u8])
        }
    }

    struct SlowAdapter;

    #[async_trait]
    impl RecognitionAdapter for SlowAdapter {
        async fn recognize(&self, _page_image: &[u8]) -> Result<Option<RecognitionResult>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl RecognitionAdapter for FailingAdapter {
        async fn recognize(&self, _page_image: &[u8]) -> Result<Option<RecognitionResult>> {
            anyhow::bail!("connection reset")
        }
    }

    fn page(index: usize) -> PageRef {
        PageRef {
            index,
            object_id: (index as u32 + 1, 0),
            width: 595.0,
            height: 842.0,
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let service = RecognitionService::new(&FixedImage, &SlowAdapter, Duration::from_millis(20));

        let err = service.recognize_page(&page(0)).await.unwrap_err();

        assert!(matches!(err, RecognitionError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_adapter_failure_is_reported() {
        let service = RecognitionService::new(&FixedImage, &FailingAdapter, Duration::from_secs(1));

        let err = service.recognize_page(&page(2)).await.unwrap_err();

        assert!(matches!(err, RecognitionError::AdapterFailed { .. }));
    }
}
