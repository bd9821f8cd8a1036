/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志（默认 info 级别，可通过 `RUST_LOG` 覆盖）
///
/// 重复调用是安全的，只有第一次生效
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `pdf_path`: 源PDF路径
/// - `mode`: 切分模式
/// - `output_dir`: 输出目录
pub fn log_startup(pdf_path: &str, mode: &str, output_dir: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 试卷拆分模式: {}", mode);
    info!("📄 源文件: {}", pdf_path);
    info!("📁 输出目录: {}", output_dir);
    info!("{}", "=".repeat(60));
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 成功写出的文件数
    pub written: usize,
    /// 写出失败的文档数
    pub failed: usize,
    /// 跳过的空文档数
    pub skipped_empty: usize,
    /// 低置信度匹配数
    pub low_confidence: usize,
    /// 识别失败的页数
    pub recognition_failures: usize,
    /// 未分配的尾部页数
    pub unassigned_pages: usize,
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, output_dir: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 写出文件: {}", stats.written);
    info!("❌ 写出失败: {}", stats.failed);
    if stats.skipped_empty > 0 {
        info!("⏭️ 跳过空文档: {}", stats.skipped_empty);
    }
    if stats.low_confidence > 0 {
        info!("⚠️ 低置信度匹配: {}", stats.low_confidence);
    }
    if stats.recognition_failures > 0 {
        info!("⚠️ 识别失败页数: {}", stats.recognition_failures);
    }
    if stats.unassigned_pages > 0 {
        info!("⚠️ 未分配页数: {}", stats.unassigned_pages);
    }
    info!("{}", "=".repeat(60));
    info!("\n文件已保存至: {}", output_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
