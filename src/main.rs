//! bigview - A terminal browser for very large text files
//!
//! Lists a folder and shows the selected file. Files above the large-file
//! threshold are scrolled through a window of cached lines instead of being
//! read into memory.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use bigview::browser::Browser;
use bigview::config::{Config, IndexStrategy};
use bigview::logging;
use bigview::ui::App;

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    help: bool,
    version: bool,
    init_config: bool,
    sparse: bool,
    path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "-v" | "--version" => parsed.version = true,
            "--init-config" => parsed.init_config = true,
            "--sparse" => parsed.sparse = true,
            other if other.starts_with('-') => anyhow::bail!("Unknown option: {}", other),
            other => {
                if parsed.path.is_some() {
                    anyhow::bail!("Only one path may be given");
                }
                parsed.path = Some(PathBuf::from(other));
            }
        }
    }
    Ok(parsed)
}

/// Folder to browse and the file to preselect, if PATH named a file
fn resolve_target(path: &Path) -> (PathBuf, Option<String>) {
    if path.is_file() {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        (dir, name)
    } else {
        (path.to_path_buf(), None)
    }
}

fn main() -> Result<()> {
    let argv: Vec<String> = env::args().collect();
    let program = argv.first().map(String::as_str).unwrap_or("bigview");

    let args = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(program);
            std::process::exit(2);
        }
    };

    if args.help {
        print_usage(program);
        return Ok(());
    }

    if args.version {
        println!("bigview {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.init_config {
        let created = Config::create_default_if_missing()?;
        let path = Config::config_path().unwrap_or_default();
        if created {
            println!("Wrote default config to {}", path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
        return Ok(());
    }

    // Logging problems should never keep the viewer from starting
    if let Err(e) = logging::init() {
        eprintln!("bigview: logging disabled: {:#}", e);
    }

    let mut config = Config::load();
    if args.sparse {
        config.index.strategy = IndexStrategy::Sparse;
    }

    let target = args.path.unwrap_or_else(|| PathBuf::from("."));
    let (dir, preselect) = resolve_target(&target);

    let mut browser = Browser::open(&dir, &config)
        .with_context(|| format!("Failed to open {}", dir.display()))?;
    if let Some(name) = preselect {
        browser.select_name(&name);
    }

    let mut app = App::new(browser, config.viewer.max_line_width)
        .context("Failed to initialize terminal")?;
    app.run().context("Viewer error")?;

    Ok(())
}

fn print_usage(program: &str) {
    println!(
        r#"bigview - Terminal browser for very large text files

USAGE:
    {} [OPTIONS] [PATH]

DESCRIPTION:
    Browse a folder and read its files. Files larger than the configured
    threshold (1 MiB by default) are never loaded whole: only a window of
    lines around the visible area is kept in memory.

    PATH may be a folder (browsed) or a file (its folder is browsed with the
    file selected). Defaults to the current directory.

OPTIONS:
    -h, --help      Show this help message
    -v, --version   Show version
    --sparse        Index every Nth line offset while counting lines so
                    jumps deep into a file do not rescan from the start
    --init-config   Write the default config file and exit

KEYBINDINGS:
    Up/Down         Select item / scroll one line
    Enter           Open folder / focus content
    Tab             Switch panel
    PgUp/PgDn       Page up/down
    Home/End        Go to top/bottom
    F5, Ctrl+R      Refresh listing
    F1, ?           Help
    q, Ctrl+C       Quit

ENVIRONMENT:
    BIGVIEW_LOG     Log filter (e.g. "bigview=debug"), written to
                    the bigview.log file in your cache directory

EXAMPLES:
    {} ~/notes
    {} --sparse /var/log/huge.log
"#,
        program, program, program
    );
}
