use lopdf::ObjectId;

/// 对源 PDF 中某一页的引用，不持有页面内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRef {
    /// 从 0 开始的页码
    pub index: usize,
    /// 页面对象在源文档中的编号
    pub object_id: ObjectId,
    pub width: f32,
    pub height: f32,
}

/// 一名学生的输出文档，逐页构建、只提交一次
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDocument {
    pub id: String,
    pub name: String,
    pub pages: Vec<PageRef>,
}

impl StudentDocument {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pages: Vec::new(),
        }
    }

    pub fn push(&mut self, page: PageRef) {
        self.pages.push(page);
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_indices(&self) -> Vec<usize> {
        self.pages.iter().map(|p| p.index).collect()
    }
}

impl std::fmt::Display for StudentDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{} ({}页)", self.id, self.name, self.pages.len())
    }
}
