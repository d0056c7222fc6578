use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use fitplay::{
    cli,
    config::{self, FetchSettings, ProviderConfig},
    error,
    strava::MAX_PER_PAGE,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Log diagnostics (requests, retries, token refreshes) to stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Strava activity export
    #[clap(subcommand)]
    Strava(StravaCommand),

    /// Spotify playlists
    #[clap(subcommand)]
    Spotify(SpotifyCommand),

    #[clap(about = "Print shell completions")]
    Completions(CompletionsOption),
}

#[derive(Subcommand, Debug, Clone)]
enum StravaCommand {
    #[clap(about = "Authorize fitplay to read your Strava activities")]
    Auth(AuthOptions),

    #[clap(about = "Export recent activities and a per-sport summary as CSV")]
    Export(ExportArgs),
}

#[derive(Subcommand, Debug, Clone)]
enum SpotifyCommand {
    #[clap(about = "Authorize fitplay to manage your Spotify playlists")]
    Auth(AuthOptions),

    #[clap(about = "Create a playlist from a list of songs")]
    Playlist(PlaylistArgs),
}

#[derive(Args, Debug, Clone)]
struct AuthOptions {
    /// Authorization code to exchange instead of opening the browser
    #[clap(long)]
    code: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    #[clap(long, default_value_t = 730, value_parser = clap::value_parser!(u32).range(1..=36500))]
    days_back: u32,

    #[clap(long, default_value_t = MAX_PER_PAGE)]
    per_page: u32,

    /// Stop at the first activity starting on or after this date (YYYY-MM-DD)
    #[clap(long)]
    before: Option<String>,

    #[clap(long, default_value = "strava_activities_last_2_years.csv")]
    output: PathBuf,

    #[clap(long, default_value = "strava_summary_by_sport.csv")]
    summary: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct PlaylistArgs {
    #[clap(long)]
    name: Option<String>,

    #[clap(long)]
    description: Option<String>,

    /// Songs as "Title - Artist"; defaults to SPOTIFY_DEFAULT_SONGS
    #[clap(long, num_args = 1..)]
    songs: Vec<String>,

    #[clap(long)]
    private: bool,

    #[clap(long)]
    skip_existing: bool,
}

#[derive(Args, Debug, Clone)]
struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fitplay=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let settings = match FetchSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("{}", e),
    };

    let result = match cli.command {
        Command::Strava(StravaCommand::Auth(opt)) => {
            cli::auth(&ProviderConfig::strava(), &settings, opt.code).await
        }
        Command::Strava(StravaCommand::Export(opt)) => {
            let opts = cli::ExportOptions {
                days_back: opt.days_back,
                per_page: opt.per_page,
                before: opt.before,
                output: opt.output,
                summary: opt.summary,
            };
            cli::export(&ProviderConfig::strava(), &settings, &opts).await
        }
        Command::Spotify(SpotifyCommand::Auth(opt)) => {
            cli::auth(&ProviderConfig::spotify(), &settings, opt.code).await
        }
        Command::Spotify(SpotifyCommand::Playlist(opt)) => {
            let opts = cli::PlaylistOptions {
                name: opt.name.unwrap_or_else(config::playlist_name),
                description: opt.description.unwrap_or_else(config::playlist_description),
                songs: if opt.songs.is_empty() {
                    config::default_songs()
                } else {
                    opt.songs
                },
                public: !opt.private,
                skip_existing: opt.skip_existing,
            };
            cli::playlist(&ProviderConfig::spotify(), &settings, &opts).await
        }
        Command::Completions(_) => Ok(()),
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
