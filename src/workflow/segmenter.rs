//! 按名单切分 - 流程层
//!
//! 名单顺序即试卷顺序，每名学生按"页数"依次取页

use crate::models::{PageRef, Roster, StudentDocument};
use tracing::{debug, warn};

/// 接收已完成的学生文档
///
/// 每份文档只会被提交一次，提交后由接收方负责
pub trait DocumentSink {
    fn flush(&mut self, document: StudentDocument);
}

impl DocumentSink for Vec<StudentDocument> {
    fn flush(&mut self, document: StudentDocument) {
        self.push(document);
    }
}

/// 切分统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentReport {
    /// 提交的文档数（含空文档）
    pub documents: usize,
    /// 未分到任何页的空文档数
    pub empty_documents: usize,
    /// 名单总页数不足导致未分配的尾部页数
    pub unassigned_pages: usize,
    /// 低置信度匹配数
    pub low_confidence: usize,
    /// 识别失败（已按未识别处理）的页数
    pub recognition_failures: usize,
}

/// 按名单中的页数顺序切分
///
/// - 游标从第0页开始只前进不后退
/// - 每名学生都会提交一份文档，页数不足时提交部分或空文档
/// - 名单总页数小于源页数时，剩余页不分配
pub fn segment_by_roster(
    pages: &[PageRef],
    roster: &Roster,
    sink: &mut dyn DocumentSink,
) -> SegmentReport {
    let mut report = SegmentReport::default();
    let mut cursor = 0usize;

    for entry in roster.entries() {
        let mut document = StudentDocument::new(entry.id.clone(), entry.name.clone());

        let end = (cursor + entry.page_count as usize).min(pages.len());
        for page in &pages[cursor..end] {
            document.push(*page);
        }
        cursor = end;

        if document.is_empty() {
            report.empty_documents += 1;
        } else if document.pages.len() < entry.page_count as usize {
            warn!(
                "⚠️ 源PDF页数不足：{} 需要 {} 页，实际 {} 页",
                entry,
                entry.page_count,
                document.pages.len()
            );
        }

        debug!("切分: {} -> 页 {:?}", entry, document.page_indices());
        report.documents += 1;
        sink.flush(document);
    }

    report.unassigned_pages = pages.len() - cursor;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterEntry;

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

    fn roster(entries: &[(&str, &str, u32)]) -> Roster {
        entries
            .iter()
            .map(|(id, name, count)| RosterEntry::new(*id, *name, *count))
            .collect()
    }

    #[test]
    fn test_roster_split_assigns_consecutive_pages() {
        let roster = roster(&[("1001", "Alice", 2), ("1002", "Bob", 3)]);
        let mut documents: Vec<StudentDocument> = Vec::new();

        let report = segment_by_roster(&pages(5), &roster, &mut documents);

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "1001");
        assert_eq!(documents[0].page_indices(), vec![0, 1]);
        assert_eq!(documents[1].name, "Bob");
        assert_eq!(documents[1].page_indices(), vec![2, 3, 4]);
        assert_eq!(report.unassigned_pages, 0);
        assert_eq!(report.empty_documents, 0);
    }

    #[test]
    fn test_roster_longer_than_source() {
        let roster = roster(&[("1", "A", 2), ("2", "B", 2), ("3", "C", 2)]);
        let mut documents: Vec<StudentDocument> = Vec::new();

        let report = segment_by_roster(&pages(3), &roster, &mut documents);

        let assigned: Vec<Vec<usize>> = documents.iter().map(|d| d.page_indices()).collect();
        assert_eq!(assigned, vec![vec![0, 1], vec![2], vec![]]);
        assert_eq!(report.documents, 3);
        assert_eq!(report.empty_documents, 1);
    }

    #[test]
    fn test_trailing_pages_unassigned() {
        let roster = roster(&[("1", "A", 2)]);
        let mut documents: Vec<StudentDocument> = Vec::new();

        let report = segment_by_roster(&pages(5), &roster, &mut documents);

        assert_eq!(documents[0].page_indices(), vec![0, 1]);
        assert_eq!(report.unassigned_pages, 3);
    }

    #[test]
    fn test_partition_property() {
        let counts: [&[u32]; 4] = [&[2, 2, 2], &[0, 3, 1], &[5], &[1, 1, 1, 1, 1, 1, 1]];

        for counts in counts {
            for total in 0..8 {
                let entries: Vec<RosterEntry> = counts
                    .iter()
                    .enumerate()
                    .map(|(i, c)| RosterEntry::new(i.to_string(), "x", *c))
                    .collect();
                let roster = Roster::new(entries);
                let mut documents: Vec<StudentDocument> = Vec::new();

                segment_by_roster(&pages(total), &roster, &mut documents);

                let assigned: Vec<usize> =
                    documents.iter().flat_map(|d| d.page_indices()).collect();
                let expected: Vec<usize> = (0..total.min(roster.total_pages())).collect();
                assert_eq!(assigned, expected, "counts={:?} total={}", counts, total);
                assert_eq!(documents.len(), roster.len());
            }
        }
    }

    #[test]
    fn test_zero_page_entry_gets_empty_document() {
        let roster = roster(&[("1", "A", 0), ("2", "B", 2)]);
        let mut documents: Vec<StudentDocument> = Vec::new();

        let report = segment_by_roster(&pages(2), &roster, &mut documents);

        assert!(documents[0].is_empty());
        assert_eq!(documents[1].page_indices(), vec![0, 1]);
        assert_eq!(report.empty_documents, 1);
    }
}
