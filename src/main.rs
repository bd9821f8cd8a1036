use anyhow::Result;
use clap::Parser;
use paper_splitter::cli::{Cli, SplitMode};
use paper_splitter::clients::VisionClient;
use paper_splitter::config::Config;
use paper_splitter::infrastructure::PdftoppmRenderer;
use paper_splitter::orchestrator::{App, RunOptions};
use paper_splitter::services::VisionRecognizer;
use paper_splitter::utils::logging;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let cli = Cli::parse();

    // 加载配置
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };

    let options = RunOptions::from(&cli);
    if options.mode == SplitMode::Ocr || options.roster_path.is_none() {
        if !PdftoppmRenderer::is_available() {
            warn!("⚠️ 未找到 pdftoppm，识别模式下所有页面都将按未识别处理");
        }
        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，识别请求可能失败");
        }
    }

    let renderer = PdftoppmRenderer::new(&options.pdf_path, config.render_dpi);
    let recognizer = VisionRecognizer::new(VisionClient::new(&config));

    // 初始化并运行应用
    let app = App::initialize(options, config)?;
    app.run(&renderer, &recognizer).await;

    Ok(())
}
