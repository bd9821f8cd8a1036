use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::models::loaders::DEFAULT_PAGE_COUNT_COLUMN;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "paper_splitter",
    version,
    about = "按学生拆分扫描试卷PDF"
)]
pub struct Cli {
    /// 输入的PDF文件路径
    #[arg(long)]
    pub pdf_path: PathBuf,

    /// 输出目录
    #[arg(long, default_value = "./output")]
    pub output_dir: PathBuf,

    /// 学生名单（xlsx / xls / ods / csv）
    #[arg(long)]
    pub excel_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SplitMode::Ocr)]
    pub mode: SplitMode,

    /// 名单中每名学生页数所在的列
    #[arg(long, default_value = DEFAULT_PAGE_COUNT_COLUMN)]
    pub pages_field: String,

    /// TOML 配置文件；不指定时只读取环境变量
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// 切分模式
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SplitMode {
    /// 识别每组信息页上的学号姓名
    Ocr,
    /// 按名单顺序和页数切分
    Excel,
}

impl SplitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Excel => "excel",
        }
    }
}
