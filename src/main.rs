use anyhow::Result;
use auto_video_gen::utils::logging;
use auto_video_gen::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(&config.output_log_file));

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
