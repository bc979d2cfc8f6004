use clap::{Parser, Subcommand};
use host_context::relay::GenerationKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "host-context")]
#[command(about = "Extracts structured host context from a rental hosting dashboard")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach to a WebDriver browser session and follow the live page
    Watch {
        /// Location to open before watching
        #[arg(long)]
        start_url: Option<String>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// WebDriver endpoint (overrides config and WEBDRIVER_URL)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Generation relay base URL
        #[arg(long)]
        relay_url: Option<String>,

        /// Request a draft reply for every new guest message
        #[arg(long, default_value_t = false)]
        draft_replies: bool,
    },

    /// Run one extraction against a saved HTML page
    Extract {
        /// Location the page was saved from; decides the page type
        #[arg(long)]
        url: String,

        /// Saved HTML file
        #[arg(long)]
        html: PathBuf,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the consolidated text here (a directory gets a timestamped file)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Send a saved consolidated context to the relay and print the result
    Generate {
        /// File holding the consolidated context text
        #[arg(long)]
        context: PathBuf,

        #[arg(long, value_enum, default_value_t = GenerationKind::Reply)]
        kind: GenerationKind,

        /// Instruction appended to the context instead of the default one
        #[arg(long)]
        instruction: Option<String>,

        /// Generation relay base URL
        #[arg(long)]
        relay_url: Option<String>,
    },
}
