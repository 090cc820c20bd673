use anyhow::Context;
use castcheck_common::config::{ConfigLoader, SuiteConfig};
use castcheck_common::{Driver, LaunchOptions};
use castcheck_e::WebDriverDriver;
use castcheck_e::chromedriver::DEFAULT_CHROMEDRIVER_PORT;
use castcheck_engine::{Fixture, Scenario, SearchScenario};
use castcheck_h::ChromiumDriver;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "castcheck", version, about = "IMDb search and cast profile checks")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// testdata.properties to use instead of the default search paths
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Which journey to run
    #[arg(long, value_enum, default_value_t = ScenarioChoice::All, global = true)]
    scenario: ScenarioChoice,

    /// Where reports, screenshots and page sources are written
    #[arg(long, default_value = "target/castcheck-artifacts", global = true)]
    artifacts: PathBuf,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Drive Chromium directly over CDP
    Headless {
        /// Show the browser window unless a CI signal forces headless
        #[arg(long)]
        visible: bool,
    },
    /// Drive Chrome through WebDriver. Spawns chromedriver unless a URL is given.
    Webdriver {
        /// External WebDriver URL
        #[arg(long)]
        driver_url: Option<String>,

        /// Port for the spawned chromedriver
        #[arg(long, default_value_t = DEFAULT_CHROMEDRIVER_PORT)]
        port: u16,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScenarioChoice {
    CastProfile,
    TitleSearch,
    All,
}

impl ScenarioChoice {
    fn scenarios(self, config: &SuiteConfig) -> Vec<SearchScenario> {
        match self {
            ScenarioChoice::CastProfile => vec![SearchScenario::cast_profile(config.clone())],
            ScenarioChoice::TitleSearch => vec![SearchScenario::title_search(config.clone())],
            ScenarioChoice::All => vec![
                SearchScenario::cast_profile(config.clone()),
                SearchScenario::title_search(config.clone()),
            ],
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // stdout carries the run summary only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_driver(mode: &Mode, options: &mut LaunchOptions) -> Box<dyn Driver> {
    match mode {
        Mode::Headless { visible } => {
            if *visible && !options.ci {
                options.headless = false;
            }
            Box::new(ChromiumDriver::new())
        }
        Mode::Webdriver { driver_url, port } => match driver_url {
            Some(url) => Box::new(WebDriverDriver::with_url(url.clone())),
            None => Box::new(WebDriverDriver::on_port(*port)),
        },
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load test data")?;
    info!(
        "Loaded test data: query '{}', cast > {}, member #{}",
        config.search_term, config.cast_min_count, config.cast_member_index
    );

    let mut options = LaunchOptions::from_env(&config.browser);
    let mut driver = build_driver(&args.mode, &mut options);
    let fixture = Fixture::new(options, args.artifacts.clone());

    let mut all_passed = true;
    for scenario in args.scenario.scenarios(&config) {
        let run = fixture.run(&scenario, driver.as_mut()).await;
        let report = &run.report;
        match &report.error {
            None => println!("PASS {} ({} ms)", scenario.name(), report.duration_ms),
            Some(e) => println!("FAIL {} ({} ms): {}", scenario.name(), report.duration_ms, e),
        }
        all_passed &= report.passed();
    }
    Ok(all_passed)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
