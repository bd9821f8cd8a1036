//! 试卷拆分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次拆分运行的资源管理和流程调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载名单、打开源PDF（任一失败即终止）
//! 2. **模式选择**：Excel 模式缺少名单时退回识别模式
//! 3. **流程委托**：委托 workflow 完成分组
//! 4. **输出写入**：逐份写出学生文档，单份失败不影响其他学生
//! 5. **全局统计**：汇总写出、失败、跳过和低置信度数量

use crate::cli::{Cli, SplitMode};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{PageImageSource, SourceDocument};
use crate::models::{load_roster, Roster, RosterColumns, StudentDocument};
use crate::services::{Assembler, MatchingService, RecognitionAdapter, RecognitionService};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::utils::RunStats;
use crate::workflow::{segment_by_roster, DocumentSink, RecognitionFlow, SegmentReport};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// 单次运行的参数
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pdf_path: PathBuf,
    pub output_dir: PathBuf,
    pub roster_path: Option<PathBuf>,
    pub mode: SplitMode,
    pub pages_field: String,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            pdf_path: cli.pdf_path.clone(),
            output_dir: cli.output_dir.clone(),
            roster_path: cli.excel_path.clone(),
            mode: cli.mode,
            pages_field: cli.pages_field.clone(),
        }
    }
}

/// 应用主结构
pub struct App {
    options: RunOptions,
    config: Config,
    roster: Option<Roster>,
    source: SourceDocument,
}

impl App {
    /// 初始化应用
    ///
    /// 名单和源PDF在切分开始前加载，任一失败都直接返回错误
    pub fn initialize(options: RunOptions, config: Config) -> AppResult<Self> {
        log_startup(
            &options.pdf_path.display().to_string(),
            options.mode.as_str(),
            &options.output_dir.display().to_string(),
        );

        let roster = match &options.roster_path {
            Some(path) => {
                let columns = RosterColumns::new(
                    config.id_column.clone(),
                    config.name_column.clone(),
                    options.pages_field.clone(),
                );
                Some(load_roster(path, &columns)?)
            }
            None => None,
        };

        let source = SourceDocument::open(&options.pdf_path)?;

        Ok(Self {
            options,
            config,
            roster,
            source,
        })
    }

    /// 实际使用的切分模式
    pub fn effective_mode(&self) -> SplitMode {
        match (self.options.mode, &self.roster) {
            (SplitMode::Excel, None) => SplitMode::Ocr,
            (mode, _) => mode,
        }
    }

    /// 运行应用主逻辑
    ///
    /// # 参数
    /// - `images`: 页面图像来源（仅识别模式使用）
    /// - `adapter`: 识别适配器（仅识别模式使用）
    pub async fn run(
        &self,
        images: &dyn PageImageSource,
        adapter: &dyn RecognitionAdapter,
    ) -> RunStats {
        let mut sink = WritingSink::new(&self.source, Assembler::new(&self.options.output_dir));

        let report = match (self.effective_mode(), &self.roster) {
            (SplitMode::Excel, Some(roster)) => self.split_by_roster(roster, &mut sink),
            (mode, roster) => {
                if mode != self.options.mode {
                    warn!("⚠️ Excel 模式需要学生名单，改用识别模式");
                }
                self.split_by_recognition(roster.as_ref(), images, adapter, &mut sink)
                    .await
            }
        };

        let mut stats = sink.into_stats();
        stats.low_confidence = report.low_confidence;
        stats.recognition_failures = report.recognition_failures;
        stats.unassigned_pages = report.unassigned_pages;

        print_final_stats(&stats, &self.options.output_dir.display().to_string());
        stats
    }

    fn split_by_roster(&self, roster: &Roster, sink: &mut WritingSink<'_>) -> SegmentReport {
        let page_count = self.source.page_count();
        let roster_pages = roster.total_pages();
        info!(
            "📋 按名单切分: {} 名学生，名单页数 {}，源PDF页数 {}",
            roster.len(),
            roster_pages,
            page_count
        );
        if roster_pages != page_count {
            warn!(
                "⚠️ 名单页数合计 ({}) 与源PDF页数 ({}) 不一致",
                roster_pages, page_count
            );
        }

        let report = segment_by_roster(self.source.pages(), roster, sink);

        if report.unassigned_pages > 0 {
            warn!(
                "⚠️ 源PDF最后 {} 页未分配给任何学生",
                report.unassigned_pages
            );
        }
        report
    }

    async fn split_by_recognition(
        &self,
        roster: Option<&Roster>,
        images: &dyn PageImageSource,
        adapter: &dyn RecognitionAdapter,
        sink: &mut WritingSink<'_>,
    ) -> SegmentReport {
        info!(
            "🔍 按识别结果切分: 源PDF {} 页，{}",
            self.source.page_count(),
            match roster {
                Some(r) => format!("名单 {} 名学生", r.len()),
                None => "无名单".to_string(),
            }
        );

        let recognition = RecognitionService::new(
            images,
            adapter,
            Duration::from_secs(self.config.recognition_timeout_secs),
        );
        let matcher =
            roster.map(|r| MatchingService::new(r).verbose(self.config.verbose_logging));

        RecognitionFlow::new(recognition, matcher)
            .run(self.source.pages(), sink)
            .await
    }
}

/// 把完成的学生文档写出到输出目录
struct WritingSink<'a> {
    source: &'a SourceDocument,
    assembler: Assembler,
    stats: RunStats,
}

impl<'a> WritingSink<'a> {
    fn new(source: &'a SourceDocument, assembler: Assembler) -> Self {
        Self {
            source,
            assembler,
            stats: RunStats::default(),
        }
    }

    fn into_stats(self) -> RunStats {
        self.stats
    }
}

impl DocumentSink for WritingSink<'_> {
    fn flush(&mut self, document: StudentDocument) {
        if document.is_empty() {
            warn!("⚠️ {}_{} 没有分到任何页，跳过", document.id, document.name);
            self.stats.skipped_empty += 1;
            return;
        }

        match self.assembler.write(self.source, &document) {
            Ok(path) => {
                info!("✓ 已保存: {} ({} 页)", path.display(), document.pages.len());
                self.stats.written += 1;
            }
            Err(e) => {
                error!("❌ {} 保存失败: {}", document, e);
                self.stats.failed += 1;
            }
        }
    }
}
