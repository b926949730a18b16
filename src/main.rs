use anyhow::Result;
use clap::Parser;
use welearn_autopilot::cli::run_cmd::{self, RunArgs};
use welearn_autopilot::course::workitems::DEFAULT_MAX_SECTION;

#[derive(Parser)]
#[command(
    name = "welearn",
    about = "WeLearn course-unit autopilot — logs in over SSO and reports full completion for every unit",
    version,
    after_help = "Values not given as flags are prompted for interactively."
)]
struct Cli {
    /// Log in by adopting a captured session cookie
    #[arg(long, conflicts_with_all = ["user", "password"])]
    cookie: Option<String>,

    /// Account (phone number or username) for password login
    #[arg(long)]
    user: Option<String>,

    /// Password for password login
    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Course study page URL (carries cid and classid)
    #[arg(long)]
    course_url: Option<String>,

    /// Account id, skipping automatic discovery
    #[arg(long)]
    uid: Option<String>,

    /// Units to process (default 1-8)
    #[arg(long, value_delimiter = ',')]
    units: Vec<u32>,

    /// Sections attempted per unit
    #[arg(long, default_value_t = DEFAULT_MAX_SECTION)]
    max_section: u32,

    /// Minimum pause between items, seconds
    #[arg(long, default_value_t = 1.0)]
    min_delay: f64,

    /// Maximum pause between items, seconds
    #[arg(long, default_value_t = 2.0)]
    max_delay: f64,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,

    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    run_cmd::run(RunArgs {
        cookie: cli.cookie,
        user: cli.user,
        password: cli.password,
        course_url: cli.course_url,
        uid: cli.uid,
        units: cli.units,
        max_section: cli.max_section,
        min_delay: cli.min_delay,
        max_delay: cli.max_delay,
        yes: cli.yes,
    })
    .await
}
