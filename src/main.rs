mod api;
mod config;
mod error;
mod i18n;
mod models;
mod runtime;
mod storage;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::api::HttpPinService;
use crate::error::Result;
use crate::i18n::{Translations, resolve_language};
use crate::runtime::Runtime;
use crate::storage::FileFavorites;
use crate::ui::{App, render};

const LOG_FILE: &str = "publicbin.log";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 终端里的公共文本板
#[derive(Parser, Debug)]
#[command(name = "publicbin", version, about)]
struct Cli {
    /// 服务地址，覆盖配置文件
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// 界面语言 (en, ru, ar, de, zh, ja)
    #[arg(long, value_name = "CODE")]
    lang: Option<String>,

    /// 配置文件路径
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 数据目录，存放收藏和日志
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,
}

/// 日志写入文件，stdout 归 TUI 使用
fn init_tracing(data_dir: &Path) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    let data_dir = config::data_dir(cli.data_dir.as_deref())?;
    init_tracing(&data_dir)?;

    let api_url = config.api_url(cli.api_url.as_deref())?;
    let translations = Translations::load()?;
    let language = resolve_language(cli.lang.as_deref(), config.language.as_deref());
    let service = HttpPinService::new(api_url, config.http_timeout());
    let favorites = FileFavorites::in_dir(&data_dir);
    tracing::info!(
        api = %service.base_url(),
        favorites = %favorites.path().display(),
        language = language.code(),
        "starting"
    );

    let runtime = Runtime::new(Arc::new(service));
    let mut app = App::new(translations, language, Box::new(favorites));

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    // 不捕获鼠标，保留终端自身的文本选择
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 主循环
    let result = run_app(&mut terminal, &mut app, &runtime);

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal loop failed");
    }
    tracing::info!("exiting");

    Ok(result?)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    runtime: &Runtime,
) -> io::Result<()> {
    loop {
        for command in app.take_commands() {
            runtime.execute(command);
        }

        app.viewport = terminal.size()?;
        terminal.draw(|f| render(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && ui::handle_key_event(app, key)? {
                    break;
                }
            }
        }

        for completion in runtime.drain() {
            app.apply(completion);
        }
    }
    Ok(())
}
