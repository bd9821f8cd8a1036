use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 学生名单读取错误（致命，切分开始前终止）
    #[error("名单读取错误: {0}")]
    Read(#[from] ReadError),
    /// 源 PDF 错误（致命）
    #[error("PDF错误: {0}")]
    Pdf(#[from] PdfError),
    /// 识别错误（非致命，降级为"未识别"）
    #[error("识别错误: {0}")]
    Recognition(#[from] RecognitionError),
    /// 输出写入错误（仅影响单个学生）
    #[error("写入错误: {0}")]
    Write(#[from] WriteError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 学生名单读取错误
#[derive(Debug, Error)]
pub enum ReadError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 无法打开或解析表格
    #[error("无法解析表格 ({path}): {source}")]
    ParseFailed { path: String, source: BoxedSource },
    /// 不支持的文件格式
    #[error("不支持的名单格式: {path}")]
    UnsupportedFormat { path: String },
    /// 缺少必需的列
    #[error("名单缺少列 '{column}' ({path})")]
    MissingColumn { path: String, column: String },
    /// 名单为空
    #[error("名单为空: {path}")]
    Empty { path: String },
}

/// 源 PDF 错误
#[derive(Debug, Error)]
pub enum PdfError {
    /// 加载失败
    #[error("无法加载PDF ({path}): {source}")]
    LoadFailed {
        path: String,
        #[source]
        source: lopdf::Error,
    },
    /// 页面对象缺失或损坏
    #[error("第 {page_index} 页结构损坏: {reason}")]
    BrokenPage { page_index: usize, reason: String },
}

/// 识别错误
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// 页面渲染失败
    #[error("第 {page_index} 页渲染失败: {source}")]
    RenderFailed {
        page_index: usize,
        source: BoxedSource,
    },
    /// 模型调用失败
    #[error("识别模型调用失败: {source}")]
    AdapterFailed { source: BoxedSource },
    /// 模型调用超时
    #[error("识别模型调用超时 ({secs} 秒)")]
    Timeout { secs: u64 },
}

/// 输出写入错误
#[derive(Debug, Error)]
pub enum WriteError {
    /// 创建输出目录失败
    #[error("创建输出目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 保存 PDF 失败
    #[error("保存PDF失败 ({path}): {source}")]
    SaveFailed { path: String, source: BoxedSource },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建表格解析错误
    pub fn roster_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Read(ReadError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺列错误
    pub fn missing_column(path: impl Into<String>, column: impl Into<String>) -> Self {
        AppError::Read(ReadError::MissingColumn {
            path: path.into(),
            column: column.into(),
        })
    }

    /// 创建 PDF 加载错误
    pub fn pdf_load_failed(path: impl Into<String>, source: lopdf::Error) -> Self {
        AppError::Pdf(PdfError::LoadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建 PDF 保存错误
    pub fn save_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Write(WriteError::SaveFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为致命错误（应终止整个运行）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Read(_) | AppError::Pdf(_) | AppError::Config(_)
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
