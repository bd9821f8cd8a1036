//! 学生名单加载
//!
//! 支持 Excel（xlsx / xlsm / xlsb / xls / ods，通过 calamine）与 CSV。
//! 第一行为表头，按列名定位学号、姓名和页数列。

use crate::error::{AppError, AppResult, ReadError};
use crate::models::identity::{UNKNOWN_ID, UNKNOWN_NAME};
use crate::models::roster::{Roster, RosterEntry, DEFAULT_PAGE_COUNT};
use calamine::{open_workbook_auto, Data, Reader};
use phf::phf_map;
use std::path::Path;
use tracing::{debug, info, warn};

/// 默认的页数列名
pub const DEFAULT_PAGE_COUNT_COLUMN: &str = "page-count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    PageCount,
}

/// 常见的表头别名（原始名单通常使用中文表头）
static HEADER_ALIASES: phf::Map<&'static str, Column> = phf_map! {
    "学号" => Column::Id,
    "student_id" => Column::Id,
    "姓名" => Column::Name,
    "student_name" => Column::Name,
    "页数" => Column::PageCount,
};

/// 名单列名配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterColumns {
    pub id: String,
    pub name: String,
    pub page_count: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            name: "name".to_string(),
            page_count: DEFAULT_PAGE_COUNT_COLUMN.to_string(),
        }
    }
}

impl RosterColumns {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        page_count: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            page_count: page_count.into(),
        }
    }

    fn classify(&self, header: &str) -> Option<Column> {
        if header == self.id {
            return Some(Column::Id);
        }
        if header == self.name {
            return Some(Column::Name);
        }
        if header == self.page_count {
            return Some(Column::PageCount);
        }
        match HEADER_ALIASES.get(header).copied() {
            // 页数列名被显式配置时不再接受别名
            Some(Column::PageCount) if self.page_count != DEFAULT_PAGE_COUNT_COLUMN => None,
            other => other,
        }
    }
}

/// 表格单元格，屏蔽 Excel 与 CSV 的差异
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            other => RawCell::Text(other.to_string()),
        }
    }
}

impl RawCell {
    fn from_csv_field(field: &str) -> Self {
        if field.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(field.to_string())
        }
    }

    /// 转成文本；整数形式的浮点数（如 1001.0）不保留小数部分
    fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            RawCell::Number(f) if f.is_finite() && f.fract() == 0.0 => {
                Some(format!("{}", *f as i64))
            }
            RawCell::Number(f) => Some(f.to_string()),
        }
    }

    fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

/// 解析页数；缺失或非数字（包括 NaN）按默认 2 页处理
pub(crate) fn parse_page_count(cell: Option<&RawCell>) -> u32 {
    let value = match cell {
        Some(RawCell::Number(f)) => Some(*f),
        Some(RawCell::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(RawCell::Empty) | None => None,
    };

    match value {
        Some(f) if f.is_finite() => {
            if f <= 0.0 {
                0
            } else {
                f.trunc().min(u32::MAX as f64) as u32
            }
        }
        _ => DEFAULT_PAGE_COUNT,
    }
}

/// 从文件加载学生名单
///
/// # 参数
/// - `path`: 名单文件路径（按扩展名选择 Excel 或 CSV）
/// - `columns`: 列名配置
pub fn load_roster(path: &Path, columns: &RosterColumns) -> AppResult<Roster> {
    let path_str = path.display().to_string();

    if !path.exists() {
        return Err(ReadError::NotFound { path: path_str }.into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet_rows(path)?,
        "csv" => read_csv_rows(path)?,
        _ => return Err(ReadError::UnsupportedFormat { path: path_str }.into()),
    };

    let roster = parse_roster_rows(rows, columns, &path_str)?;
    info!(
        "✓ 名单加载完成: {} 名学生，共 {} 页",
        roster.len(),
        roster.total_pages()
    );
    Ok(roster)
}

fn read_spreadsheet_rows(path: &Path) -> AppResult<Vec<Vec<RawCell>>> {
    let path_str = path.display().to_string();

    let mut workbook =
        open_workbook_auto(path).map_err(|e| AppError::roster_parse_failed(&path_str, e))?;

    // 与原始名单一致，只读取第一个工作表
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReadError::Empty {
            path: path_str.clone(),
        })?
        .map_err(|e| AppError::roster_parse_failed(&path_str, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(RawCell::from).collect())
        .collect())
}

fn read_csv_rows(path: &Path) -> AppResult<Vec<Vec<RawCell>>> {
    let path_str = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::roster_parse_failed(&path_str, e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::roster_parse_failed(&path_str, e))?;
        rows.push(record.iter().map(RawCell::from_csv_field).collect());
    }
    Ok(rows)
}

/// 将表格行解析为名单（第一行为表头）
pub(crate) fn parse_roster_rows(
    rows: Vec<Vec<RawCell>>,
    columns: &RosterColumns,
    source: &str,
) -> AppResult<Roster> {
    let mut rows = rows.into_iter();

    let header = rows.next().ok_or_else(|| ReadError::Empty {
        path: source.to_string(),
    })?;

    let mut id_col = None;
    let mut name_col = None;
    let mut pages_col = None;

    for (idx, cell) in header.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        // 兼容带 BOM 的 CSV
        let text = text.trim_start_matches('\u{feff}');
        match columns.classify(text) {
            Some(Column::Id) if id_col.is_none() => id_col = Some(idx),
            Some(Column::Name) if name_col.is_none() => name_col = Some(idx),
            Some(Column::PageCount) if pages_col.is_none() => pages_col = Some(idx),
            _ => {}
        }
    }

    let id_col = id_col.ok_or_else(|| AppError::missing_column(source, &columns.id))?;
    let name_col = name_col.ok_or_else(|| AppError::missing_column(source, &columns.name))?;

    if pages_col.is_none() {
        warn!(
            "⚠️ 名单中没有页数列 '{}'，每名学生按 {} 页处理",
            columns.page_count, DEFAULT_PAGE_COUNT
        );
    }

    let mut entries = Vec::new();
    // 表头是第 1 行
    for (offset, row) in rows.enumerate() {
        let row_number = offset + 2;

        if row.iter().all(RawCell::is_blank) {
            debug!("跳过空行: 第 {} 行", row_number);
            continue;
        }

        // 缺学号或姓名的行仍然占用页数，缺失字段用占位文本代替
        let id = row.get(id_col).and_then(RawCell::as_text).unwrap_or_else(|| {
            warn!("⚠️ 第 {} 行缺少 '{}'，使用 {}", row_number, columns.id, UNKNOWN_ID);
            UNKNOWN_ID.to_string()
        });
        let name = row.get(name_col).and_then(RawCell::as_text).unwrap_or_else(|| {
            warn!("⚠️ 第 {} 行缺少 '{}'，使用 {}", row_number, columns.name, UNKNOWN_NAME);
            UNKNOWN_NAME.to_string()
        });
        let page_count = parse_page_count(pages_col.and_then(|col| row.get(col)));

        entries.push(RosterEntry::new(id, name, page_count));
    }

    if entries.is_empty() {
        return Err(ReadError::Empty {
            path: source.to_string(),
        }
        .into());
    }

    Ok(Roster::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_page_count_defaults() {
        assert_eq!(parse_page_count(None), 2);
        assert_eq!(parse_page_count(Some(&RawCell::Empty)), 2);
        assert_eq!(parse_page_count(Some(&text("abc"))), 2);
        assert_eq!(parse_page_count(Some(&text("NaN"))), 2);
        assert_eq!(parse_page_count(Some(&RawCell::Number(f64::NAN))), 2);
    }

    #[test]
    fn test_page_count_numeric_values() {
        assert_eq!(parse_page_count(Some(&RawCell::Number(3.0))), 3);
        assert_eq!(parse_page_count(Some(&text(" 4 "))), 4);
        assert_eq!(parse_page_count(Some(&RawCell::Number(2.7))), 2);
        assert_eq!(parse_page_count(Some(&RawCell::Number(-1.0))), 0);
    }

    #[test]
    fn test_csv_roster_in_order() {
        let file = write_csv("id,name,page-count\n1001,Alice,2\n1002,Bob,3\n");

        let roster = load_roster(file.path(), &RosterColumns::default()).unwrap();

        assert_eq!(
            roster.entries(),
            &[
                RosterEntry::new("1001", "Alice", 2),
                RosterEntry::new("1002", "Bob", 3),
            ]
        );
        assert_eq!(roster.total_pages(), 5);
    }

    #[test]
    fn test_non_numeric_page_count_defaults_to_two() {
        let file = write_csv("id,name,page-count\n1001,Alice,two\n1002,Bob,\n");

        let roster = load_roster(file.path(), &RosterColumns::default()).unwrap();

        assert_eq!(roster.entries()[0].page_count, 2);
        assert_eq!(roster.entries()[1].page_count, 2);
    }

    #[test]
    fn test_chinese_headers() {
        let file = write_csv("\u{feff}学号,姓名,页数\n20230101,张三,4\n");

        let roster = load_roster(file.path(), &RosterColumns::default()).unwrap();

        assert_eq!(roster.entries(), &[RosterEntry::new("20230101", "张三", 4)]);
    }

    #[test]
    fn test_custom_page_count_column_ignores_alias() {
        let file = write_csv("id,name,页数,sheets\n1001,Alice,4,3\n");
        let columns = RosterColumns::new("id", "name", "sheets");

        let roster = load_roster(file.path(), &columns).unwrap();

        assert_eq!(roster.entries()[0].page_count, 3);
    }

    #[test]
    fn test_missing_name_column() {
        let file = write_csv("id,page-count\n1001,2\n");

        let err = load_roster(file.path(), &RosterColumns::default()).unwrap_err();

        assert!(matches!(
            err,
            AppError::Read(ReadError::MissingColumn { ref column, .. }) if column == "name"
        ));
    }

    #[test]
    fn test_blank_rows_skipped_and_incomplete_rows_kept() {
        let rows = vec![
            vec![text("id"), text("name"), text("page-count")],
            vec![RawCell::Number(1001.0), text("Alice"), RawCell::Number(2.0)],
            vec![RawCell::Empty, RawCell::Empty, RawCell::Empty],
            vec![RawCell::Number(1003.0), RawCell::Empty, RawCell::Number(3.0)],
            vec![RawCell::Empty, text("Dave"), RawCell::Number(1.0)],
        ];

        let roster = parse_roster_rows(rows, &RosterColumns::default(), "test").unwrap();

        assert_eq!(
            roster.entries(),
            &[
                RosterEntry::new("1001", "Alice", 2),
                RosterEntry::new("1003", UNKNOWN_NAME, 3),
                RosterEntry::new(UNKNOWN_ID, "Dave", 1),
            ]
        );
        assert_eq!(roster.total_pages(), 6);
    }

    #[test]
    fn test_float_ids_render_without_fraction() {
        let rows = vec![
            vec![text("id"), text("name"), text("page-count")],
            vec![RawCell::Number(1001.0), text("Alice"), RawCell::Number(2.0)],
        ];

        let roster = parse_roster_rows(rows, &RosterColumns::default(), "test").unwrap();

        assert_eq!(roster.entries()[0].id, "1001");
    }

    #[test]
    fn test_header_only_is_empty_roster() {
        let file = write_csv("id,name,page-count\n");

        let err = load_roster(file.path(), &RosterColumns::default()).unwrap_err();

        assert!(matches!(err, AppError::Read(ReadError::Empty { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();

        let err = load_roster(file.path(), &RosterColumns::default()).unwrap_err();

        assert!(matches!(
            err,
            AppError::Read(ReadError::UnsupportedFormat { .. })
        ));
    }
}
