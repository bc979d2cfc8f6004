use chrono::Utc;
use clap::Parser;
use host_context::relay::{RelayClient, compose_prompt};
use host_context::{Config, Watcher, consolidate, utils};
use std::error::Error;
use std::path::Path;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let result = match args.command {
        Command::Watch {
            start_url,
            config,
            webdriver_url,
            relay_url,
            draft_replies,
        } => watch(start_url, config.as_deref(), webdriver_url, relay_url, draft_replies).await,
        Command::Extract {
            url,
            html,
            config,
            out,
        } => extract(&url, &html, config.as_deref(), out.as_deref()),
        Command::Generate {
            context,
            kind,
            instruction,
            relay_url,
        } => generate(&context, kind, instruction.as_deref(), relay_url).await,
    };

    if let Err(e) = result {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    Ok(config.with_env_overrides())
}

async fn watch(
    start_url: Option<String>,
    config: Option<&Path>,
    webdriver_url: Option<String>,
    relay_url: Option<String>,
    draft_replies: bool,
) -> Result<(), Box<dyn Error>> {
    println!("Note: watching requires a WebDriver server (e.g., ChromeDriver).");
    println!("Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444");

    let mut watcher = Watcher::new(load_config(config)?).with_draft_replies(draft_replies);
    if let Some(start_url) = start_url {
        watcher = watcher.with_start_url(start_url);
    }
    if let Some(webdriver_url) = webdriver_url {
        watcher = watcher.with_webdriver_url(webdriver_url);
    }
    if let Some(relay_url) = relay_url {
        watcher = watcher.with_relay_url(relay_url);
    }
    watcher.run().await?;
    Ok(())
}

fn extract(url: &str, html: &Path, config: Option<&Path>, out: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = load_config(config)?;
    let html = std::fs::read_to_string(html)?;
    let context = host_context::extract_page(&config, url, &html)?;
    let text = consolidate::consolidated_text(&context);

    match out {
        Some(target) => {
            let path = utils::export_path(target, Utc::now());
            std::fs::write(&path, &text)?;
            ::log::info!("Wrote {} context to {}", context.page_type, path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

async fn generate(
    context: &Path,
    kind: host_context::relay::GenerationKind,
    instruction: Option<&str>,
    relay_url: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut config = Config::default().relay;
    if let Some(relay_url) = relay_url {
        config.base_url = relay_url;
    }
    let context = std::fs::read_to_string(context)?;
    let prompt = compose_prompt(&context, Some(instruction.unwrap_or(kind.default_instruction())));

    let client = RelayClient::new(&config)?;
    let text = client.generate(kind, &prompt).await?;
    println!("{}", text);
    Ok(())
}
