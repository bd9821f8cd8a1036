/// 页数字段缺失或无法解析时使用的默认页数
pub const DEFAULT_PAGE_COUNT: u32 = 2;

/// 名单中的一名学生
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub page_count: u32,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, page_count: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            page_count,
        }
    }
}

impl std::fmt::Display for RosterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({}页)", self.id, self.name, self.page_count)
    }
}

/// 学生名单
///
/// 加载后不可变；顺序有语义（决定按序切页与位置加分）。
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 名单中所有学生的页数之和
    pub fn total_pages(&self) -> usize {
        self.entries.iter().map(|e| e.page_count as usize).sum()
    }

    /// 查找学号与姓名都完全一致的学生
    pub fn find_exact(&self, id: &str, name: &str) -> Option<(usize, &RosterEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.id == id && e.name == name)
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = RosterEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
