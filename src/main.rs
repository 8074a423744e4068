//! 离线页面翻译：读取 HTML，执行一次翻译扫描，输出翻译后的 HTML

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use tokio::task::LocalSet;

use tweet_translator::config::{AppConfig, ConfigManager, ProviderKind};
use tweet_translator::html::get_charset;
use tweet_translator::preferences::{JsonFileBackend, PreferenceError};
use tweet_translator::logging::init_logging;
use tweet_translator::translation::build_translator;
use tweet_translator::{
    PageSession, PreferenceStore, Preferences, PreferencesUpdate, RcDomTree, TranslationClient,
};

#[derive(Parser, Debug)]
#[command(name = "tweet-translator", version, about = "Translate tweet text in a saved HTML page")]
struct Cli {
    /// 输入 HTML 文件，省略或为 "-" 时读取 stdin
    input: Option<PathBuf>,

    /// 输出文件，默认 stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 源语言，可以为 auto
    #[arg(short = 's', long)]
    source_lang: Option<String>,

    /// 目标语言
    #[arg(short = 't', long)]
    target_lang: Option<String>,

    /// 翻译提供方: google, deepl
    #[arg(long)]
    provider: Option<String>,

    /// 覆盖翻译 API 地址
    #[arg(long)]
    api_url: Option<String>,

    /// 文档编码，默认从 <meta charset> 检测
    #[arg(short, long)]
    encoding: Option<String>,

    /// 配置文件
    #[arg(short, long)]
    config: Option<String>,

    /// 偏好设置文件 (JSON)，不存在时写入默认值；命令行指定的语言会写回该文件
    #[arg(long, value_name = "FILE")]
    preferences: Option<PathBuf>,

    /// 打印环境变量说明后退出
    #[arg(long)]
    env_docs: bool,
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.parse::<ProviderKind>()?;
    }
    if let Some(api_url) = &cli.api_url {
        config.translation.api_url = Some(api_url.clone());
    }
    if let Some(lang) = &cli.source_lang {
        config.translation.source_lang = lang.clone();
    }
    if let Some(lang) = &cli.target_lang {
        config.translation.target_lang = lang.clone();
    }

    config.validate()?;
    Ok(config)
}

fn load_preferences(cli: &Cli, config: &AppConfig) -> Result<PreferenceStore, PreferenceError> {
    let Some(path) = &cli.preferences else {
        return Ok(PreferenceStore::new(Preferences {
            source_lang: config.translation.source_lang.clone(),
            target_lang: config.translation.target_lang.clone(),
            enabled: true,
        }));
    };

    let store = PreferenceStore::load(Box::new(JsonFileBackend::new(path)))?;
    store.on_change(|prefs| {
        tracing::info!(
            source_lang = %prefs.source_lang,
            target_lang = %prefs.target_lang,
            "偏好设置已保存"
        );
    });

    let mut update = PreferencesUpdate::new();
    if let Some(lang) = &cli.source_lang {
        update = update.source_lang(lang.clone());
    }
    if let Some(lang) = &cli.target_lang {
        update = update.target_lang(lang.clone());
    }
    if update != PreferencesUpdate::default() {
        store.set(update);
    }

    let current = store.get();
    tracing::debug!(
        source_lang = %current.source_lang,
        target_lang = %current.target_lang,
        enabled = current.enabled,
        "使用偏好设置文件 {}",
        path.display()
    );
    Ok(store)
}

fn read_input(input: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read(path),
        _ => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data)?;
            Ok(data)
        }
    }
}

fn parse_document(data: &[u8], encoding: Option<&str>) -> io::Result<(RcDomTree, String)> {
    if let Some(encoding) = encoding {
        return Ok((RcDomTree::from_bytes(data, encoding)?, encoding.to_string()));
    }

    let tree = RcDomTree::from_bytes(data, "utf-8")?;
    match get_charset(tree.document()) {
        Some(charset) if !charset.eq_ignore_ascii_case("utf-8") => {
            tracing::debug!("检测到文档编码: {}", charset);
            Ok((RcDomTree::from_bytes(data, &charset)?, charset))
        }
        _ => Ok((tree, "utf-8".to_string())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.env_docs {
        println!("{}", tweet_translator::env::generate_env_docs());
        return Ok(());
    }

    init_logging();

    let config = load_config(&cli)?;
    let data = read_input(cli.input.as_ref())?;
    let (tree, encoding) = parse_document(&data, cli.encoding.as_deref())?;

    let client = TranslationClient::new(build_translator(&config.translation)?);
    let preferences = Arc::new(load_preferences(&cli, &config)?);

    let tree = Rc::new(tree);
    let session = PageSession::new(tree.clone(), preferences, client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let summary = LocalSet::new().block_on(&runtime, session.translate_pass());

    tracing::info!(
        translated = summary.translated,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "页面翻译完成"
    );

    let html = tree.to_html(&encoding)?;
    match &cli.output {
        Some(path) => fs::write(path, html)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&html)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
