use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Default)]
#[command(name = "cod-relay")]
#[command(about = "Chat-completion relay with Chain of Draft instrumentation", long_about = None)]
pub struct Args {
    #[arg(long = "bind", help = "Address to listen on (e.g., 0.0.0.0:3000)")]
    pub bind: Option<String>,

    #[arg(
        long = "api-endpoint",
        help = "Upstream API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(long = "config", help = "Path to a YAML or JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long = "log-format",
        value_enum,
        default_value_t = LogFormat::Text,
        help = "Log output format"
    )]
    pub log_format: LogFormat,
}
