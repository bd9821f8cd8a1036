use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 是否显示详细日志（逐页打分明细）
    pub verbose_logging: bool,
    /// 页面渲染分辨率（DPI）
    pub render_dpi: u32,
    /// 单次识别调用的超时时间（秒）
    pub recognition_timeout_secs: u64,
    // --- 名单列名 ---
    pub id_column: String,
    pub name_column: String,
    // --- 视觉模型配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            render_dpi: 100,
            recognition_timeout_secs: 60,
            id_column: "id".to_string(),
            name_column: "name".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            llm_model_name: "qwen2.5-vl-72b-instruct".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再应用环境变量覆盖
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            render_dpi: env_parse("RENDER_DPI").unwrap_or(self.render_dpi),
            recognition_timeout_secs: env_parse("RECOGNITION_TIMEOUT_SECS")
                .unwrap_or(self.recognition_timeout_secs),
            id_column: self.id_column,
            name_column: self.name_column,
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str) -> Option<T> {
    std::env::var(var_name).ok().and_then(|v| v.parse().ok())
}
