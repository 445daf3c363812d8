//! Market Lens CLI
//!
//! Terminal front end for the job market analyzer API.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use market_lens::{
    config::{DEFAULT_CONFIG_PATH, load_config},
    error::Result,
    models::{AlertRequest, ExportFormat, FilterCriteria},
    pipeline,
    services::MarketData,
    utils::log as console,
};

/// Market Lens - Job Market Dashboard
#[derive(Parser, Debug)]
#[command(
    name = "market-lens",
    version,
    about = "Cached job market data from the terminal"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary stats, recent activity and top technologies
    Dashboard,

    /// Search the offer list locally
    Offers {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Results per page (default from config)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Company, location, technology, experience and salary analytics
    Analytics,

    /// Trigger a backend scan, then refresh the dashboard
    Scan {
        /// Listing pages to scan (1-10)
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Create a job alert
    Alert {
        #[arg(long)]
        email: String,

        /// Keyword to watch (repeatable)
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// daily, weekly or immediate
        #[arg(long, default_value = "daily")]
        frequency: String,
    },

    /// Offers matching an existing alert
    AlertJobs {
        /// Alert identifier
        id: String,
    },

    /// Recent notifications
    Notifications,

    /// Market summary report
    Report {
        /// Reporting period, e.g. 7d or 30d
        #[arg(long, default_value = "30d")]
        period: String,
    },

    /// Export offers
    Export {
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        #[command(flatten)]
        filters: FilterArgs,

        /// Write the exported data to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check API connectivity
    Health,

    /// Validate configuration
    Validate,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Free-text term (title, company, description)
    #[arg(long)]
    q: Option<String>,

    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    technology: Option<String>,

    #[arg(long)]
    min_salary: Option<f64>,

    #[arg(long)]
    max_salary: Option<f64>,

    /// full-time, part-time, contract, remote or internship
    #[arg(long)]
    job_type: Option<String>,

    /// junior, mid, senior or lead
    #[arg(long)]
    experience: Option<String>,

    /// scraped_at, title, company or location
    #[arg(long)]
    sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    sort_order: Option<String>,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            q: args.q,
            company: args.company,
            location: args.location,
            technology: args.technology,
            min_salary: args.min_salary,
            max_salary: args.max_salary,
            job_type: args.job_type,
            experience_level: args.experience,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    console::init(level);
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Validate = cli.command {
        init_logging(cli.verbose, "info");
        pipeline::run_validate(&cli.config)?;
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);
    log::info!("Using API at {}", config.api.base_url);

    let market = MarketData::from_config(&config)?;

    let result = match cli.command {
        Command::Dashboard => pipeline::run_dashboard(&market).await,

        Command::Offers {
            filters,
            page,
            page_size,
        } => {
            let page_size = page_size.unwrap_or(config.search.page_size);
            pipeline::run_offers(&market, &filters.into(), page, page_size)
                .await
                .map(|_| ())
        }

        Command::Analytics => pipeline::run_analytics(&market).await,

        Command::Scan { pages } => pipeline::run_scan(&market, pages).await.map(|_| ()),

        Command::Alert {
            email,
            keywords,
            location,
            company,
            frequency,
        } => {
            let request = AlertRequest {
                email,
                keywords,
                location,
                company,
                frequency,
            };
            pipeline::run_alert(&market, request).await.map(|_| ())
        }

        Command::AlertJobs { id } => pipeline::run_alert_jobs(&market, &id).await,

        Command::Notifications => pipeline::run_notifications(&market).await,

        Command::Report { period } => pipeline::run_report(&market, &period).await,

        Command::Export {
            format,
            filters,
            output,
        } => pipeline::run_export(&market, format.into(), filters.into(), output.as_deref())
            .await
            .map(|_| ()),

        Command::Health => pipeline::run_health(&market).await,

        Command::Validate => Ok(()),
    };

    market.shutdown();
    result
}
