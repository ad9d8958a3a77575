use clap::Parser;
use episode_ratings::{
    PlotOptions, ProgressEvent, ScraperArgs, ScraperConfig, Session, fetch_ratings, flatten, render,
};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scrape the episode ratings of a tv series and chart them per season
#[derive(Parser, Debug)]
#[command(name = "episode-ratings", version)]
struct Cli {
    /// Series title to search for (the first search result is used)
    #[arg(short, long)]
    title: String,

    /// Draw a chart of the ratings
    #[arg(short, long)]
    plot: bool,

    /// Mark the mean rating on the chart
    #[arg(short, long)]
    mean: bool,

    /// Mark a polynomial trend on the chart
    #[arg(long)]
    trend: bool,

    /// Degree of the trend polynomial
    #[arg(long, default_value_t = 1)]
    trend_degree: usize,

    /// Width of the chart bars in characters
    #[arg(long, default_value_t = 50)]
    width: usize,

    /// Print the ratings as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    scraper: ScraperArgs,
}

/// Handles progress events and prints them to stderr
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Resolving { title } => {
            eprintln!("Searching for '{}'...", title);
        }
        ProgressEvent::Resolved { identifier } => {
            eprintln!("Found IMDb ID: {}", identifier);
        }
        ProgressEvent::SeasonScraped {
            season,
            episode_count,
        } => {
            eprintln!("  Season {}: {} episode(s)", season, episode_count);
        }
        ProgressEvent::SeasonSkipped { season } => {
            eprintln!("  Season {}: no ratings yet, skipped", season);
        }
        ProgressEvent::Complete { season_count } => {
            eprintln!("Scraped {} season(s).", season_count);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ScraperConfig::from(cli.scraper);

    let session = match Session::new(&config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Could not set up HTTP session");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let ratings = match fetch_ratings(&session, &config, &cli.title, handle_progress_event) {
        Ok(ratings) => ratings,
        Err(e) => {
            tracing::error!(title = %cli.title, error = %e, "Fetching ratings failed");
            eprintln!("\nError: {}", e);
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&ratings) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: could not serialize ratings: {}", e);
                process::exit(1);
            }
        }
    }

    if cli.plot {
        let options = PlotOptions {
            mean: cli.mean,
            trend_degree: cli.trend.then_some(cli.trend_degree),
            width: cli.width,
        };
        println!();
        print!("{}", render(&flatten(&ratings), &options));
    }
}
