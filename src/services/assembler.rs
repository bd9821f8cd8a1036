//! 输出组装 - 业务能力层
//!
//! 把一名学生的页面原样拷贝为独立的 PDF 文件

use crate::error::{AppError, AppResult, WriteError};
use crate::infrastructure::SourceDocument;
use crate::models::StudentDocument;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 文件名中不允许出现的字符
const INVALID_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 输出组装器
///
/// 职责：
/// - 只从源文档拷贝指定页面引用到的对象（不重新编码内容流）
/// - 生成 `{学号}_{姓名}.pdf`，同一次运行内重名时追加序号
/// - 写入失败只影响当前学生
pub struct Assembler {
    output_dir: PathBuf,
    used_names: HashSet<String>,
    name_counters: HashMap<String, usize>,
}

impl Assembler {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            used_names: HashSet::new(),
            name_counters: HashMap::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 创建输出目录
    pub fn prepare(&self) -> AppResult<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| {
            AppError::Write(WriteError::CreateDirFailed {
                path: self.output_dir.display().to_string(),
                source,
            })
        })
    }

    /// 写出一名学生的文档，返回输出路径
    pub fn write(&mut self, source: &SourceDocument, document: &StudentDocument) -> AppResult<PathBuf> {
        self.prepare()?;

        let mut output = source.extract_pages(&document.pages)?;

        let file_name = self.unique_file_name(document);
        let path = self.output_dir.join(file_name);
        debug!(
            "写出 {} -> {} (页: {:?})",
            document,
            path.display(),
            document.page_indices()
        );

        output
            .save(&path)
            .map_err(|e| AppError::save_failed(path.display().to_string(), e))?;

        Ok(path)
    }

    fn unique_file_name(&mut self, document: &StudentDocument) -> String {
        let stem = format!(
            "{}_{}",
            sanitize_component(&document.id),
            sanitize_component(&document.name)
        );

        let mut candidate = stem.clone();
        while self.used_names.contains(&candidate) {
            let counter = self.name_counters.entry(stem.clone()).or_insert(1);
            *counter += 1;
            candidate = format!("{}_{}", stem, counter);
        }

        if candidate != stem {
            warn!("⚠️ 文件名重复: {}.pdf，改为 {}.pdf", stem, candidate);
        }
        self.used_names.insert(candidate.clone());
        format!("{}.pdf", candidate)
    }
}

/// 替换文件名中的非法字符与控制字符
pub fn sanitize_component(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
