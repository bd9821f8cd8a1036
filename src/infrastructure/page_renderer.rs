//! 页面渲染 - 基础设施层
//!
//! 把源 PDF 的某一页渲染为 PNG 字节，供识别模型使用

use crate::models::PageRef;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// 页面图像来源
#[async_trait]
pub trait PageImageSource: Send + Sync {
    /// 返回指定页面的 PNG 字节
    async fn page_image(&self, page: &PageRef) -> Result<Vec<u8>>;
}

/// 使用 poppler 的 `pdftoppm` 渲染页面
pub struct PdftoppmRenderer {
    pdf_path: PathBuf,
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(pdf_path: &Path, dpi: u32) -> Self {
        Self {
            pdf_path: pdf_path.to_path_buf(),
            dpi,
        }
    }

    /// 检查 `pdftoppm` 是否可用
    pub fn is_available() -> bool {
        std::process::Command::new("pdftoppm")
            .arg("-v")
            .output()
            .is_ok()
    }
}

#[async_trait]
impl PageImageSource for PdftoppmRenderer {
    async fn page_image(&self, page: &PageRef) -> Result<Vec<u8>> {
        // pdftoppm 的页码从 1 开始
        let page_number = page.index + 1;
        let work_dir = tempfile::tempdir().context("无法创建临时目录")?;
        let output_root = work_dir.path().join("page");
        let png_path = output_root.with_extension("png");

        debug!(
            "渲染第 {} 页 ({} DPI): {}",
            page.index,
            self.dpi,
            self.pdf_path.display()
        );

        let output = Command::new("pdftoppm")
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-singlefile")
            .arg("-png")
            .arg(&self.pdf_path)
            .arg(&output_root)
            .output()
            .await
            .with_context(|| format!("无法执行 pdftoppm: {}", self.pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftoppm 返回非零状态 (第 {} 页): {}",
                page.index,
                stderr.trim()
            );
        }

        let bytes = tokio::fs::read(&png_path)
            .await
            .with_context(|| format!("pdftoppm 未生成图片: {}", png_path.display()))?;

        Ok(bytes)
    }
}
