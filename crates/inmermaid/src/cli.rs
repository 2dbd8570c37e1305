use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "inmermaid")]
#[command(author, version, about = "Telegram bot that renders Mermaid diagrams as images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a single diagram to a PNG file and exit
    Render {
        /// Path to a file with Mermaid source, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Where to write the rendered PNG
        #[arg(short, long, default_value = "diagram.png")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
