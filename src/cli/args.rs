use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "launchlist",
    version,
    about = "browse SpaceX launches from the terminal",
    long_about = "launchlist browses the SpaceX launch catalogue with search, status filtering and incremental loading.\n\nExamples:\n  launchlist login\n  launchlist browse --search falcon\n  launchlist list --status failed --all -o failed.json\n  launchlist list --fixture ./launches.json --pages 2\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.launchlist/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "token-file",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Where the login token is kept (defaults to ~/.launchlist/jwtToken)."
    )]
    pub token_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store the login token.
    Login,
    /// Remove the login token.
    Logout,
    /// Show whether you are logged in.
    Status,
    /// Print launches and exit.
    List(ListArgs),
    /// Scroll through launches interactively.
    Browse(BrowseArgs),
    /// Write a default config file.
    Init,
}

impl Command {
    pub fn source_args(&self) -> Option<&SourceArgs> {
        match self {
            Command::List(a) => Some(&a.source),
            Command::Browse(a) => Some(&a.source),
            _ => None,
        }
    }

    pub fn filter_args(&self) -> Option<&FilterArgs> {
        match self {
            Command::List(a) => Some(&a.filter),
            Command::Browse(a) => Some(&a.filter),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(
        long = "api-url",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Source",
        help = "Launch query endpoint."
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "page-size",
        visible_alias = "ps",
        value_name = "N",
        help_heading = "Source",
        help = "Launches requested per page."
    )]
    pub page_size: Option<u32>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Source",
        help = "Per-request timeout in seconds (no limit by default)."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'p',
        long = "proxy",
        visible_alias = "px",
        value_name = "URL",
        help_heading = "Source",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "fixture",
        value_name = "FILE",
        help_heading = "Source",
        help = "Serve launches from a JSON file instead of the API."
    )]
    pub fixture: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(
        short = 's',
        long = "search",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Only show launches whose name or details contain TEXT (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'S',
        long = "status",
        visible_alias = "filter",
        value_name = "STATUS",
        help_heading = "Filters",
        help = "Launch outcome to show: all, successful or failed."
    )]
    pub status: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(
        short = 'P',
        long = "pages",
        value_name = "N",
        help_heading = "Listing",
        help = "Number of pages to load."
    )]
    pub pages: Option<u32>,

    #[arg(
        short = 'a',
        long = "all",
        help_heading = "Listing",
        help = "Keep loading pages until the end of launches."
    )]
    pub all: bool,

    #[arg(
        short = 'o',
        long = "output",
        visible_alias = "out",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub output_format: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(
        short = 'r',
        long = "viewport",
        visible_alias = "rows",
        value_name = "N",
        help_heading = "Browsing",
        help = "Launch cards per screen."
    )]
    pub viewport: Option<usize>,
}
