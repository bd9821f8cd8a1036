//! 视觉模型客户端
//!
//! 封装与 OpenAI 兼容接口（如阿里云百炼 / DashScope）的图片对话调用
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 图片以 base64 data URL 形式随用户消息发送

use crate::config::Config;
use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

/// 视觉模型客户端
///
/// 启动时根据配置创建一次，显式传给需要它的组件
pub struct VisionClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl VisionClient {
    /// 创建新的视觉模型客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 发送一张 PNG 图片和文字提问
    ///
    /// # 参数
    /// - `png_bytes`: 图片字节
    /// - `user_message`: 用户消息
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回模型的回复文本
    pub async fn ask_with_image(
        &self,
        png_bytes: &[u8],
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!(
            "调用视觉模型，模型: {}，图片大小: {} 字节",
            self.model_name,
            png_bytes.len()
        );

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes));

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url,
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: user_message.to_string(),
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(
                content_parts,
            ))
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(256u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("视觉模型调用失败: {}", e);
            anyhow::anyhow!("视觉模型调用失败: {}", e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("视觉模型返回内容为空"))?;

        debug!("视觉模型调用成功");

        Ok(content.trim().to_string())
    }
}
