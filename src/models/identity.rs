//! 学生身份：识别得到的候选身份，以及与名单比对后的结果

use std::fmt::Display;

/// 学号缺失时在输出文件名中使用的占位文本
pub const UNKNOWN_ID: &str = "unknown-id";
/// 姓名缺失时在输出文件名中使用的占位文本
pub const UNKNOWN_NAME: &str = "unknown-name";
/// 低置信度匹配的姓名前缀
pub const LOW_CONFIDENCE_PREFIX: &str = "W.";

/// 从识别结果中提取出的候选身份
///
/// 缺失字段保持为 `None`，只有在生成文件名时才替换为占位文本，
/// 因此名单中真实学号恰好等于占位文本的学生不会被误匹配。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IdentityCandidate {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl IdentityCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    pub fn id_or_placeholder(&self) -> &str {
        self.id.as_deref().unwrap_or(UNKNOWN_ID)
    }

    pub fn name_or_placeholder(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}

impl Display for IdentityCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}",
            self.id_or_placeholder(),
            self.name_or_placeholder()
        )
    }
}

/// 单次比对中某个名单条目的得分，只在一次匹配内部存在
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    pub entry_index: usize,
    pub score: i64,
}

/// 与名单比对后的身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// 命中的名单下标
    pub entry_index: usize,
    pub id: String,
    /// 低置信度时带 `W.` 前缀
    pub name: String,
    /// 完全匹配时为 `None`
    pub score: Option<i64>,
    pub trusted: bool,
}
