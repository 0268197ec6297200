use clap::Parser;
use std::path::PathBuf;

use crate::TimestamperError;

pub const USAGE: &str = "Usage: timestamper <youtube_url> [interval_minutes]
Example: timestamper https://youtube.com/watch?v=xxx 30
         timestamper https://youtu.be/xxx 30
         timestamper --batch urls.txt 20";

#[derive(Parser, Debug)]
#[command(
    name = "timestamper",
    about = "Video Timestamper - Extract witty timestamps from long YouTube videos using Gemini",
    version,
    long_about = "Asks a Gemini model to watch a YouTube video and describe it, with a bit of humour, at fixed intervals across the first two hours. The result is printed and saved as a text report plus a JSON file."
)]
pub struct Cli {
    /// YouTube URL (watch, youtu.be or embed form)
    #[arg(value_name = "YOUTUBE_URL")]
    pub url: Option<String>,

    /// Minutes between timestamps (default from config, normally 30)
    #[arg(value_name = "INTERVAL_MINUTES", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Base path for the saved report; `.txt` and `.json` files are written next to each other
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the report without saving files
    #[arg(long)]
    pub no_save: bool,

    /// File with one YouTube URL per line to process in sequence
    #[arg(long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// Describe the kind of video to steer the descriptions (e.g. "a cooking show")
    #[arg(long, value_name = "TEXT")]
    pub focus: Option<String>,

    /// Gemini model to use
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, value_name = "TEMP")]
    pub temperature: Option<f64>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Interval for `--batch` runs, where the first positional slot holds the interval
    pub fn batch_interval(&self) -> Result<Option<i64>, TimestamperError> {
        match (&self.url, self.interval) {
            (None, interval) => Ok(interval),
            (Some(first), None) => first.parse().map(Some).map_err(|_| {
                TimestamperError::InvalidArgument(format!(
                    "unexpected URL '{}' together with --batch",
                    first
                ))
            }),
            (Some(_), Some(_)) => Err(TimestamperError::InvalidArgument(
                "too many positional arguments for --batch".to_string(),
            )),
        }
    }
}
