//! # Paper Splitter
//!
//! 把一份扫描的整班试卷PDF按学生拆分为独立文件
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `SourceDocument` - 唯一持有已加载的源PDF
//! - `PdftoppmRenderer` - 把单页渲染为 PNG
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，一次只处理一页或一名学生
//! - `RecognitionService` - 识别信息页上的学号姓名
//! - `MatchingService` - 与名单比对并纠正识别结果
//! - `Assembler` - 把学生的页面写成独立PDF
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义页面如何分组
//! - `segment_by_roster` - 按名单页数顺序切分
//! - `RecognitionFlow` - 逐组识别并按身份分组
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/split_processor` - 加载名单与源PDF、选择模式、写出文件、统计
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use cli::{Cli, SplitMode};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{PageImageSource, SourceDocument};
pub use models::{RecognitionResult, Roster, RosterEntry, StudentDocument};
pub use orchestrator::{App, RunOptions};
pub use services::RecognitionAdapter;
pub use workflow::{DocumentSink, RecognitionFlow, SegmentReport};
