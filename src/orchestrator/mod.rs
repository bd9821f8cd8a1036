//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次拆分运行的资源管理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! split_processor (App：名单 + 源PDF + 输出)
//!     ↓
//! workflow (segment_by_roster / RecognitionFlow)
//!     ↓
//! services (能力层：识别 / 提取 / 匹配 / 组装)
//!     ↓
//! infrastructure (基础设施：SourceDocument / PdftoppmRenderer)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有源PDF和输出目录
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体的匹配判断

pub mod split_processor;

pub use split_processor::{App, RunOptions};
