use clap::Parser;

const ENV_HELP: &str = "\
Configuration is read from the environment:

  ABS_URL           Base URL of the Audiobookshelf server (required)
  ABS_TOKEN         API token (required)
  DRY_RUN           1 = report what would be deleted without deleting
  VERIFY_SSL        0 = skip TLS certificate verification
  MEDIA_TYPE        PODCASTS, AUDIOBOOKS or EVERYTHING (default)
  DEBUG             1 = verbose logging
  AGE               Only delete items added at least this long ago (5d, 4w, 3m, 1y)
  ABS_TIMEOUT_SECS  Per-request timeout in seconds (default 30)

When ABS_URL or ABS_TOKEN is unset, missing values are read from
~/.config/abs-cleanup.env. Shows and audiobooks tagged KEEP are never touched.";

#[derive(Parser, Debug)]
#[command(name = "abs-cleanup", version)]
#[command(about = "Delete finished podcast episodes and audiobooks from Audiobookshelf", long_about = None)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {}
