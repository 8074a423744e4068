//! Web 服务器主程序入口

use std::sync::Arc;

use clap::Parser;

use tweet_translator::config::ConfigManager;
use tweet_translator::feed::{FeedOptions, FetchTranslateService};
use tweet_translator::logging::init_logging;
use tweet_translator::translation::{build_translator, TranslationClient};
use tweet_translator::twitter::TwitterApiClient;
use tweet_translator::web::{AppState, WebServer};

#[derive(Parser, Debug)]
#[command(name = "tweet-translator-web", version, about = "Tweet translation companion server")]
struct Args {
    /// 绑定地址
    #[arg(short, long)]
    bind: Option<String>,

    /// 端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件
    #[arg(short, long)]
    config: Option<String>,

    /// 写出示例配置文件后退出
    #[arg(long, value_name = "PATH")]
    generate_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging();

    if let Some(path) = &args.generate_config {
        ConfigManager::generate_example_config(path)?;
        tracing::info!("示例配置已写入: {}", path);
        return Ok(());
    }

    let manager = match &args.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(bind) = args.bind {
        config.web.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    config.validate()?;

    let provider = TwitterApiClient::from_config(&config.twitter)?;
    let client = TranslationClient::new(build_translator(&config.translation)?);
    let service = FetchTranslateService::new(Arc::new(provider), client, FeedOptions::from_config(&config));

    let server = WebServer::new(config.web.clone(), AppState::new(service));
    server.start().await?;

    Ok(())
}
