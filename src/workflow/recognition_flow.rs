//! 按识别结果切分 - 流程层
//!
//! 核心职责：定义"逐组识别并分组"的完整流程
//!
//! 流程顺序（每组页面）：
//! 1. 识别信息页 → 提取候选身份
//! 2. 有名单时与名单比对纠正
//! 3. 身份变化时提交上一份文档并开启新文档

use tracing::{info, warn};

use crate::models::identity::{UNKNOWN_ID, UNKNOWN_NAME};
use crate::models::{PageRef, StudentDocument};
use crate::services::{extract_identity, MatchingService, RecognitionService};
use crate::workflow::page_ctx::PairCtx;
use crate::workflow::segmenter::{DocumentSink, SegmentReport};

/// 一组页面解析出的身份
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedIdentity {
    /// 未识别时为 `None`，两个未识别视为同一人
    id: Option<String>,
    name: String,
}

/// 识别切分流程
///
/// - 页面按 (0,1), (2,3), … 成组，每组只识别第一页
/// - 识别失败降级为"未识别"，不中断整个运行
/// - 同一时刻只有一个识别请求
pub struct RecognitionFlow<'a> {
    recognition: RecognitionService<'a>,
    matcher: Option<MatchingService<'a>>,
}

impl<'a> RecognitionFlow<'a> {
    /// 创建新的识别切分流程；`matcher` 为 `None` 时直接使用识别结果
    pub fn new(recognition: RecognitionService<'a>, matcher: Option<MatchingService<'a>>) -> Self {
        Self {
            recognition,
            matcher,
        }
    }

    pub async fn run(&self, pages: &[PageRef], sink: &mut dyn DocumentSink) -> SegmentReport {
        let mut report = SegmentReport::default();
        let total_pairs = pages.len().div_ceil(2);
        let mut current: Option<(Option<String>, StudentDocument)> = None;

        for (pair_index, pair) in pages.chunks(2).enumerate() {
            let info_page = pair[0];
            let content_page = pair.get(1).copied();
            let ctx = PairCtx::new(
                pair_index,
                info_page.index,
                content_page.map(|p| p.index),
                total_pairs,
            );

            let identity = self.resolve_pair(&ctx, &info_page, &mut report).await;

            let mut document = match current.take() {
                Some((open_id, mut document)) if open_id == identity.id => {
                    document.push(info_page);
                    document
                }
                previous => {
                    if let Some((_, finished)) = previous {
                        report.documents += 1;
                        sink.flush(finished);
                    }
                    let id = identity.id.as_deref().unwrap_or(UNKNOWN_ID);
                    info!("{} 📄 新学生: {}_{}", ctx, id, identity.name);
                    let mut document = StudentDocument::new(id, identity.name.clone());
                    document.push(info_page);
                    document
                }
            };

            if let Some(content_page) = content_page {
                document.push(content_page);
            }
            current = Some((identity.id, document));
        }

        if let Some((_, finished)) = current {
            report.documents += 1;
            sink.flush(finished);
        }

        report
    }

    /// 识别并解析一组页面的身份
    async fn resolve_pair(
        &self,
        ctx: &PairCtx,
        info_page: &PageRef,
        report: &mut SegmentReport,
    ) -> ResolvedIdentity {
        let result = match self.recognition.recognize_page(info_page).await {
            Ok(result) => result,
            Err(e) => {
                warn!("{} ⚠️ 识别失败，按未识别处理: {}", ctx, e);
                report.recognition_failures += 1;
                None
            }
        };

        let candidate = extract_identity(result.as_ref());
        if candidate.is_unknown() {
            warn!("{} ⚠️ 未识别到学生信息", ctx);
        }

        match self
            .matcher
            .as_ref()
            .and_then(|matcher| matcher.resolve(&candidate, ctx.pair_index))
        {
            Some(outcome) => {
                if !outcome.trusted {
                    report.low_confidence += 1;
                }
                ResolvedIdentity {
                    id: Some(outcome.id),
                    name: outcome.name,
                }
            }
            None => ResolvedIdentity {
                name: candidate.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                id: candidate.id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::PageImageSource;
    use crate::models::{RecognitionResult, Roster, RosterEntry};
    use crate::services::RecognitionAdapter;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 图像内容即页码，方便脚本化识别结果
    struct IndexImage;

    #[async_trait]
    impl PageImageSource for IndexImage {
        async fn page_image(&self, page: &PageRef) -> Result<Vec<u8>> {
            Ok(vec![page.index as u8])
        }
    }

    enum Reply {
        Found(&'static str, &'static str),
        Nothing,
        Fail,
    }

    struct ScriptedAdapter {
        replies: HashMap<u8, Reply>,
        calls: Mutex<Vec<u8>>,
    }

    impl ScriptedAdapter {
        fn new(replies: Vec<(u8, Reply)>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<u8> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecognitionAdapter for ScriptedAdapter {
        async fn recognize(&self, page_image: &[u8]) -> Result<Option<RecognitionResult>> {
            let page = page_image[0];
            self.calls.lock().unwrap().push(page);
            match self.replies.get(&page) {
                Some(Reply::Found(id, name)) => Ok(Some(RecognitionResult::new(*id, *name))),
                Some(Reply::Fail) => anyhow::bail!("scripted failure"),
                Some(Reply::Nothing) | None => Ok(None),
            }
        }
    }

    fn pages(count: usize) -> Vec<PageRef> {
        (0..count)
            .map(|index| PageRef {
                index,
                object_id: (index as u32 + 10, 0),
                width: 595.0,
                height: 842.0,
            })
            .collect()
    }

    async fn run(
        adapter: &ScriptedAdapter,
        roster: Option<&Roster>,
        page_count: usize,
    ) -> (Vec<StudentDocument>, SegmentReport) {
        let service = RecognitionService::new(&IndexImage, adapter, Duration::from_secs(5));
        let flow = RecognitionFlow::new(service, roster.map(MatchingService::new));
        let mut documents: Vec<StudentDocument> = Vec::new();
        let report = flow.run(&pages(page_count), &mut documents).await;
        (documents, report)
    }

    fn summary(documents: &[StudentDocument]) -> Vec<(String, String, Vec<usize>)> {
        documents
            .iter()
            .map(|d| (d.id.clone(), d.name.clone(), d.page_indices()))
            .collect()
    }

    #[tokio::test]
    async fn test_pairs_grouped_by_identity() {
        let adapter = ScriptedAdapter::new(vec![
            (0, Reply::Found("1001", "张三")),
            (2, Reply::Found("1001", "张三")),
            (4, Reply::Found("1002", "李四")),
        ]);

        let (documents, report) = run(&adapter, None, 6).await;

        assert_eq!(
            summary(&documents),
            vec![
                ("1001".into(), "张三".into(), vec![0, 1, 2, 3]),
                ("1002".into(), "李四".into(), vec![4, 5]),
            ]
        );
        assert_eq!(report.documents, 2);
        // 答题页从不识别
        assert_eq!(adapter.calls(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_odd_page_count_keeps_last_info_page() {
        let adapter = ScriptedAdapter::new(vec![
            (0, Reply::Found("1001", "张三")),
            (2, Reply::Found("1002", "李四")),
        ]);

        let (documents, _) = run(&adapter, None, 3).await;

        assert_eq!(documents[1].page_indices(), vec![2]);
        assert_eq!(documents[1].id, "1002");
    }

    #[tokio::test]
    async fn test_failures_degrade_to_unknown_and_merge() {
        let adapter = ScriptedAdapter::new(vec![
            (0, Reply::Found("1001", "张三")),
            (2, Reply::Fail),
            (4, Reply::Nothing),
        ]);

        let (documents, report) = run(&adapter, None, 6).await;

        assert_eq!(
            summary(&documents),
            vec![
                ("1001".into(), "张三".into(), vec![0, 1]),
                ("unknown-id".into(), "unknown-name".into(), vec![2, 3, 4, 5]),
            ]
        );
        assert_eq!(report.recognition_failures, 1);
    }

    #[tokio::test]
    async fn test_missing_id_keeps_recognized_name() {
        let adapter = ScriptedAdapter::new(vec![(0, Reply::Found("  ", "王五"))]);

        let (documents, _) = run(&adapter, None, 2).await;

        assert_eq!(documents[0].id, "unknown-id");
        assert_eq!(documents[0].name, "王五");
    }

    #[tokio::test]
    async fn test_roster_corrects_and_flags() {
        let roster: Roster = vec![
            RosterEntry::new("1001", "Alice", 2),
            RosterEntry::new("1002", "Bob", 2),
        ]
        .into_iter()
        .collect();
        let adapter = ScriptedAdapter::new(vec![
            (0, Reply::Found("1001", "Alicee")),
            (2, Reply::Found("9999", "Zzz")),
        ]);

        let (documents, report) = run(&adapter, Some(&roster), 4).await;

        assert_eq!(
            summary(&documents),
            vec![
                ("1001".into(), "Alice".into(), vec![0, 1]),
                ("1002".into(), "W.Bob".into(), vec![2, 3]),
            ]
        );
        assert_eq!(report.low_confidence, 1);
    }

    #[tokio::test]
    async fn test_grouping_is_deterministic() {
        let script = || {
            ScriptedAdapter::new(vec![
                (0, Reply::Found("1001", "张三")),
                (2, Reply::Fail),
                (4, Reply::Found("1002", "李四")),
                (6, Reply::Found("1002", "李四")),
            ])
        };

        let (first, _) = run(&script(), None, 8).await;
        let (second, _) = run(&script(), None, 8).await;

        assert_eq!(first, second);
        let all: Vec<usize> = first.iter().flat_map(|d| d.page_indices()).collect();
        assert_eq!(all, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_source_flushes_nothing() {
        let adapter = ScriptedAdapter::new(vec![]);

        let (documents, report) = run(&adapter, None, 0).await;

        assert!(documents.is_empty());
        assert_eq!(report, SegmentReport::default());
    }
}
