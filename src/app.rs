use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task;
use tracing_subscriber::EnvFilter;

use crate::auth::{AuthGuard, FileTokenStore, TokenStore};
use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::filter::{FilterState, StatusFilter};
use crate::launch::Launch;
use crate::output::{self, OutputFormat};
use crate::pagination::{PageTicket, DEFAULT_PAGE_SIZE};
use crate::runner::{self, Options, Runner};
use crate::sentinel::{SentinelSignal, Viewport};
use crate::session::browse::{self, Step};
use crate::session::{LaunchList, ListEvent};
use crate::source::{RecordSource, DEFAULT_API_URL};
use crate::view::{self, CardStyle, ViewCommand};

const DEFAULT_VIEWPORT: usize = 6;

fn print_banner() {
    const BANNER: &str = r#"
    __                           __    ___      __
   / /___ ___  ______  _____/ /_  / (_)____/ /_
  / / __ `/ / / / __ \/ ___/ __ \/ / / ___/ __/
 / / /_/ / /_/ / / / / /__/ / / / / (__  ) /_
/_/\__,_/\__,_/_/ /_/\___/_/ /_/_/_/____/\__/
    "#;
    println!("{}", BANNER);
    println!("       v{} - SpaceX launches\n", env!("CARGO_PKG_VERSION"));
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_opt_value<'a>(v: &'a str, default: &'a str) -> &'a str {
    if v.trim().is_empty() {
        default
    } else {
        v
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Login,
    Logout,
    Status,
    List,
    Browse,
    Init,
}

#[derive(Clone, Debug)]
struct RunConfig {
    mode: Mode,
    config_path: Option<PathBuf>,
    token_path: PathBuf,
    no_color: bool,
    verbose: u8,
    log_level: String,
    options: Options,
    output: Option<String>,
    output_format: OutputFormat,
    viewport: usize,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let mode = match &args.command {
        Command::Login => Mode::Login,
        Command::Logout => Mode::Logout,
        Command::Status => Mode::Status,
        Command::List(_) => Mode::List,
        Command::Browse(_) => Mode::Browse,
        Command::Init => Mode::Init,
    };

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let log_level = cfg.log_level.clone().unwrap_or_else(|| "warn".to_string());

    let config_path = args
        .config
        .as_deref()
        .map(config::expand_tilde)
        .or_else(config::default_config_path);

    let token_path = match args.token_file.clone().or(cfg.token_file.clone()) {
        Some(p) => config::expand_tilde(&p),
        None => config::default_token_path()
            .ok_or_else(|| "could not determine home directory, use --token-file".to_string())?,
    };

    let source = args.command.source_args().cloned().unwrap_or_default();
    let filter = args.command.filter_args().cloned().unwrap_or_default();

    let api_url = source
        .api_url
        .or(cfg.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let page_size = source
        .page_size
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }
    let timeout_seconds = source.timeout.or(cfg.timeout);
    let proxy = source.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let fixture = source
        .fixture
        .or(cfg.fixture)
        .map(|p| config::expand_tilde_string(&p));

    let search = filter.search.or(cfg.search).unwrap_or_default();
    let status_raw = filter.status.or(cfg.status).unwrap_or_else(|| "all".to_string());
    let status = status_raw
        .parse::<StatusFilter>()
        .map_err(|e| format!("invalid status '{status_raw}': {e}"))?;

    let (max_pages, output, output_format_raw, viewport) = match args.command {
        Command::List(list) => {
            let max_pages = if list.all {
                None
            } else if let Some(pages) = list.pages {
                Some(pages)
            } else if cfg.all.unwrap_or(false) {
                None
            } else {
                Some(cfg.pages.unwrap_or(1))
            };
            let output = list
                .output
                .or(cfg.output)
                .map(|p| config::expand_tilde_string(&p));
            (max_pages, output, list.output_format.or(cfg.output_format), None)
        }
        Command::Browse(browse) => (None, None, None, browse.viewport.or(cfg.viewport)),
        _ => (Some(1), None, None, None),
    };
    if max_pages == Some(0) {
        return Err("invalid pages, expected positive integer".to_string());
    }

    let output_format = match output_format_raw {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let viewport = viewport.unwrap_or(DEFAULT_VIEWPORT);
    if viewport == 0 {
        return Err("invalid viewport, expected positive integer".to_string());
    }

    Ok(RunConfig {
        mode,
        config_path,
        token_path,
        no_color,
        verbose: args.verbose,
        log_level,
        options: Options {
            api_url,
            page_size,
            timeout_seconds,
            proxy,
            fixture,
            search,
            status,
            max_pages,
        },
        output,
        output_format,
        viewport,
    })
}

fn init_logging(verbose: u8, log_level: &str) {
    let level = match verbose {
        0 => log_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::try_new(level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
    }
    .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn open_guard(run: &RunConfig) -> Result<AuthGuard<FileTokenStore>, String> {
    AuthGuard::new(FileTokenStore::new(&run.token_path)).map_err(|e| e.to_string())
}

fn require_login(guard: &AuthGuard<FileTokenStore>) -> Result<(), String> {
    if guard.is_authenticated() {
        return Ok(());
    }
    Err("You are not authenticated. Run `launchlist login` first.".to_string())
}

fn run_init(run: &RunConfig) -> Result<(), String> {
    let path = run
        .config_path
        .clone()
        .ok_or_else(|| "could not determine config path, use --config".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!("{} wrote {}", "[OK]".bold().green(), path.display());
    } else {
        println!("config already exists at {}", path.display());
    }
    Ok(())
}

fn run_auth(run: &RunConfig) -> Result<(), String> {
    let mut guard = open_guard(run)?;
    match run.mode {
        Mode::Login => {
            guard.login().map_err(|e| e.to_string())?;
            println!("{} Logged in.", "[OK]".bold().green());
        }
        Mode::Logout => {
            guard.logout().map_err(|e| e.to_string())?;
            println!("{} Logged out.", "[OK]".bold().green());
        }
        _ => {
            if guard.is_authenticated() {
                println!("You are authenticated.");
            } else {
                println!("You are not authenticated.");
            }
        }
    }
    Ok(())
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())
}

async fn run_list(run: RunConfig) -> Result<(), String> {
    let guard = open_guard(&run)?;
    require_login(&guard)?;

    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {elapsed} {msg}")
            .map_err(|e| format!("invalid progress template: {e}"))?,
    );
    pb.set_message("loading launches");
    let result = runner.run().await;
    pb.finish_and_clear();
    let result = result.map_err(|e| e.to_string())?;

    let visible: Vec<&Launch> = result.visible.iter().collect();
    match run.output.as_deref() {
        Some(path) => {
            write_output(path, &output::render(run.output_format, &visible)).await?;
        }
        None if run.output_format == OutputFormat::Json => {
            let records = output::build_records(&visible);
            println!("{}", String::from_utf8_lossy(&output::render_json(&records)));
        }
        None => {
            let style = CardStyle::new(!run.no_color, &run.options.search);
            for launch in visible.iter() {
                println!("{}", view::render_card(launch, &style));
            }
        }
    }

    if result.interrupted {
        eprintln!(
            "{}",
            "a page failed to load, stopped there".bold().yellow()
        );
    }
    if let Some(footer) = view::render_footer(false, result.exhausted, !run.no_color) {
        eprintln!("{}", footer);
    }
    eprintln!(
        ":: Completed :: {} of {} launches shown, {} pages in {}ms ::",
        result.visible.len(),
        result.launches_loaded,
        result.pages_loaded,
        result.elapsed.as_millis()
    );
    Ok(())
}

fn render(list: &LaunchList, viewport: &Viewport, color: bool) {
    let view = list.view();
    let style = CardStyle::new(color, view.query);
    println!(
        "{}",
        view::render_window(
            &view,
            viewport.visible_range(),
            viewport.is_sentinel_visible(),
            &style
        )
    );
}

fn print_loading(color: bool) {
    if let Some(footer) = view::render_footer(true, false, color) {
        println!("{}", footer);
    }
}

// stdin reads block and cannot be cancelled, they stay off the runtime
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<String>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

struct BrowseLoop {
    list: LaunchList,
    viewport: Viewport,
    source: Arc<dyn RecordSource>,
    event_tx: mpsc::UnboundedSender<ListEvent>,
    event_rx: mpsc::UnboundedReceiver<ListEvent>,
    color: bool,
}

impl BrowseLoop {
    fn new(list: LaunchList, rows: usize, source: Arc<dyn RecordSource>, color: bool) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ListEvent>();
        let mut viewport = Viewport::new(rows);
        let sentinel_tx = event_tx.clone();
        viewport.on_sentinel_visible(Box::new(move |ratio| {
            let _ = sentinel_tx.send(ListEvent::SentinelVisible(ratio));
        }));
        Self {
            list,
            viewport,
            source,
            event_tx,
            event_rx,
            color,
        }
    }

    fn spawn_fetch(&self, ticket: PageTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        task::spawn(async move {
            let result = source.fetch_page(ticket.page, ticket.page_size).await;
            let _ = tx.send(ListEvent::PageLoaded { ticket, result });
        });
    }

    fn apply(&self, step: Step) {
        if step.failed {
            eprintln!(
                "{}",
                "failed to load launches, scroll down to try again".yellow()
            );
        }
        if step.redraw {
            render(&self.list, &self.viewport, self.color);
        }
        if let Some(ticket) = step.fetch {
            self.spawn_fetch(ticket);
            print_loading(self.color);
        }
    }

    async fn run<S: TokenStore>(
        mut self,
        guard: &mut AuthGuard<S>,
        mut lines: mpsc::UnboundedReceiver<String>,
    ) -> Result<(), String> {
        if let Some(ticket) = self.list.start() {
            self.apply(Step {
                fetch: Some(ticket),
                ..Step::default()
            });
        }

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    let step = browse::on_event(&mut self.list, &mut self.viewport, event);
                    self.apply(step);
                }
                line = lines.recv() => {
                    let Some(line) = line else {
                        break;
                    };
                    match view::parse_command(&line) {
                        Ok(ViewCommand::Help) => println!("{}", view::help_text()),
                        Ok(ViewCommand::Logout) => {
                            guard.logout().map_err(|e| e.to_string())?;
                            println!("{} Logged out.", "[OK]".bold().green());
                            break;
                        }
                        Ok(ViewCommand::Quit) => break,
                        Ok(command) => {
                            let step =
                                browse::on_command(&mut self.list, &mut self.viewport, command);
                            self.apply(step);
                        }
                        Err(msg) => eprintln!("{}", msg.red()),
                    }
                }
            }
        }
        Ok(())
    }
}

async fn run_browse(run: RunConfig) -> Result<(), String> {
    let mut guard = open_guard(&run)?;
    require_login(&guard)?;

    Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    let source = runner::build_source(&run.options)
        .await
        .map_err(|e| format!("failed to open launch source: {e}"))?;

    print_banner();
    format_kv_line(
        "Source",
        run.options.fixture.as_deref().unwrap_or(&run.options.api_url),
    );
    format_kv_line("Page size", &run.options.page_size.to_string());
    format_kv_line("Filter", run.options.status.label());
    format_kv_line("Search", format_opt_value(&run.options.search, "-"));
    println!("\ntype help for commands\n");

    let (line_tx, line_rx) = mpsc::unbounded_channel::<String>();
    spawn_stdin_reader(line_tx);

    let filter = FilterState::new(run.options.search.clone(), run.options.status);
    let list = LaunchList::with_filter(run.options.page_size, filter);
    BrowseLoop::new(list, run.viewport, source, !run.no_color)
        .run(&mut guard, line_rx)
        .await
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    match run.mode {
        Mode::List => run_list(run).await,
        Mode::Browse => run_browse(run).await,
        _ => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose, &run.log_level);
    if run.no_color {
        colored::control::set_override(false);
    }

    match run.mode {
        Mode::Init => run_init(&run),
        Mode::Login | Mode::Logout | Mode::Status => run_auth(&run),
        Mode::List | Mode::Browse => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("failed to build runtime: {e}"))?;
            let result = rt.block_on(run_async(run));
            // fetches still in flight are abandoned
            rt.shutdown_background();
            result
        }
    }
}
