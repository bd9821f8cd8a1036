//! 源 PDF - 基础设施层
//!
//! 持有源文档（lopdf `Document`），对外只暴露页面引用与只读访问

use crate::error::{AppError, AppResult, PdfError};
use crate::models::PageRef;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// 页面树深度上限，防止损坏文件中的循环 Parent
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// 可以从页面树节点继承的页面属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// 源文档
///
/// 职责：
/// - 唯一持有已加载的源 PDF
/// - 提供按顺序排列的 `PageRef`
/// - 不认识学生 / 名单
pub struct SourceDocument {
    path: PathBuf,
    document: Document,
    pages: Vec<PageRef>,
}

impl SourceDocument {
    /// 从文件加载源 PDF
    pub fn open(path: &Path) -> AppResult<Self> {
        let document = Document::load(path)
            .map_err(|e| AppError::pdf_load_failed(path.display().to_string(), e))?;
        Self::from_document(path, document)
    }

    /// 使用已加载的文档构建
    pub fn from_document(path: &Path, document: Document) -> AppResult<Self> {
        let mut pages = Vec::new();

        // get_pages 的键是从 1 开始的页码，BTreeMap 保证有序
        for (page_number, object_id) in document.get_pages() {
            let index = page_number as usize - 1;
            let (width, height) = page_dimensions(&document, object_id, index)?;
            debug!("第 {} 页: {:.1} x {:.1}", index, width, height);
            pages.push(PageRef {
                index,
                object_id,
                width,
                height,
            });
        }

        info!("📄 已加载源PDF: {} ({} 页)", path.display(), pages.len());

        Ok(Self {
            path: path.to_path_buf(),
            document,
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 只用给定页面及其引用到的对象构建新文档
    ///
    /// 其他页面的内容流和图像不会被拷贝。可继承属性直接写到每一页上，
    /// 新文档的页面树只有一层
    pub fn extract_pages(&self, pages: &[PageRef]) -> AppResult<Document> {
        let source = &self.document;
        let mut output = Document::with_version(source.version.clone());
        // 保留原对象号，引用无需改写
        output.max_id = source.max_id;
        let pages_id = output.new_object_id();

        let tree_nodes = self.page_tree_nodes();
        let mut pending: Vec<ObjectId> = Vec::new();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for page in pages {
            let mut dict = source
                .get_dictionary(page.object_id)
                .map_err(|e| PdfError::BrokenPage {
                    page_index: page.index,
                    reason: e.to_string(),
                })?
                .clone();

            for key in INHERITABLE_KEYS {
                if !dict.has(key) {
                    if let Some(value) = inherited_attribute(source, page.object_id, key) {
                        dict.set(key, value.clone());
                    }
                }
            }
            dict.set("Parent", pages_id);

            for (key, value) in dict.iter() {
                if key.as_slice() != b"Parent" {
                    push_references(value, &mut pending);
                }
            }
            output.objects.insert(page.object_id, Object::Dictionary(dict));
            kids.push(page.object_id.into());
        }

        // 页面树节点（包括未选中的页面）不跟随，其余引用对象整体拷贝
        while let Some(id) = pending.pop() {
            if tree_nodes.contains(&id) || output.objects.contains_key(&id) {
                continue;
            }
            if let Ok(object) = source.get_object(id) {
                push_references(object, &mut pending);
                output.objects.insert(id, object.clone());
            }
        }

        let count = kids.len() as i64;
        output.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = output.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        output.trailer.set("Root", catalog_id);

        Ok(output)
    }

    /// 所有页面及其祖先节点的对象号
    fn page_tree_nodes(&self) -> HashSet<ObjectId> {
        let mut nodes = HashSet::new();
        for page in &self.pages {
            let mut current = Some(page.object_id);
            for _ in 0..MAX_PAGE_TREE_DEPTH {
                let Some(id) = current else { break };
                if !nodes.insert(id) {
                    break;
                }
                current = self
                    .document
                    .get_dictionary(id)
                    .ok()
                    .and_then(|node| node.get(b"Parent").ok())
                    .and_then(|parent| parent.as_reference().ok());
            }
        }
        nodes
    }
}

fn push_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| push_references(item, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| push_references(value, out)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, value)| push_references(value, out)),
        _ => {}
    }
}

/// 页面显示尺寸：优先 CropBox，其次 MediaBox，旋转 90/270 度时交换宽高
fn page_dimensions(document: &Document, page_id: ObjectId, index: usize) -> AppResult<(f32, f32)> {
    let rect = inherited_attribute(document, page_id, b"CropBox")
        .or_else(|| inherited_attribute(document, page_id, b"MediaBox"))
        .ok_or_else(|| PdfError::BrokenPage {
            page_index: index,
            reason: "缺少 MediaBox".to_string(),
        })?;

    let (width, height) = rect_size(document, rect).ok_or_else(|| PdfError::BrokenPage {
        page_index: index,
        reason: "MediaBox 格式无效".to_string(),
    })?;

    let rotate = inherited_attribute(document, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);

    if rotate.rem_euclid(180) == 90 {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}

/// 查找页面属性，沿 Parent 链查找可继承的属性
fn inherited_attribute<'a>(document: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node: &Dictionary = document.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(document, value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = document.get_dictionary(parent).ok()?;
    }

    None
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn rect_size(document: &Document, rect: &Object) -> Option<(f32, f32)> {
    let values = rect
        .as_array()
        .ok()?
        .iter()
        .map(|obj| resolve(document, obj).and_then(number))
        .collect::<Option<Vec<f32>>>()?;

    match values.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
