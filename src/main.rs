use clap::Parser;
use glance::core::config::{self, CliOverrides, StyleName};
use glance::core::paths::expand_path;
use glance::tui::{self, app::Launch};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "glance", about = "Browse and read markdown in the terminal")]
struct Args {
    /// File or directory to open ("-" reads from stdin)
    path: Option<String>,

    /// Show all files, including hidden and ignored ones
    #[arg(short, long)]
    all: bool,

    /// Render style
    #[arg(short, long, value_enum)]
    style: Option<StyleName>,

    /// Maximum render width (0 = terminal width)
    #[arg(short, long)]
    width: Option<u16>,

    /// Clear and repaint the screen after every scroll
    #[arg(long)]
    high_perf: bool,

    /// Config file to use instead of ~/.glance/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    // Initialize file logger; the terminal belongs to the UI. It starts wide
    // open so config loading is logged, then narrows to the configured level.
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    if let Some(path) = args.log_file.clone().or_else(default_log_path)
        && let Ok(log_file) = File::create(&path)
    {
        let _ = WriteLogger::init(LevelFilter::Trace, log_config, log_file);
    }

    let file_config = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            eprintln!("glance: {e}");
            return Err(io::Error::other(e));
        }
    };
    let cli = CliOverrides {
        style: args.style,
        width: args.width,
        show_all_files: args.all,
        high_performance_pager: args.high_perf,
    };
    let resolved = config::resolve(&file_config, &cli);
    log::set_max_level(log_level(&resolved.log_level));

    log::info!(
        "Glance starting up (style {:?}, all files {}, high-perf pager {})",
        resolved.style,
        resolved.show_all_files,
        resolved.high_performance_pager
    );

    let launch = match args.path.as_deref() {
        Some("-") => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Launch::Content(content)
        }
        Some(path) => Launch::Path(PathBuf::from(expand_path(path))),
        None => Launch::Path(PathBuf::new()),
    };

    tui::run(resolved, launch).await
}

/// `glance.log` in the platform cache directory.
fn default_log_path() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("glance");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("glance.log"))
}

/// The configured level, falling back to info for anything unrecognised.
fn log_level(configured: &str) -> LevelFilter {
    LevelFilter::from_str(configured).unwrap_or(LevelFilter::Info)
}
