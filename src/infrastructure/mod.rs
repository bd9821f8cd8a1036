//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（源 PDF、外部渲染工具），只暴露能力

pub mod page_renderer;
pub mod pdf_source;

pub use page_renderer::{PageImageSource, PdftoppmRenderer};
pub use pdf_source::SourceDocument;
