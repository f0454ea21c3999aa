//! comfybot CLI: run the generation pipeline once from the command line.
//!
//! The chat-facing dispatcher is library code (see `dispatch`); this binary
//! is the operational harness for the same pipeline: prompt text in,
//! composite path out.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use comfybot::config::BotConfig;
use comfybot::dispatch::Dispatcher;
use comfybot::files::FileStore;

#[derive(Parser)]
#[command(name = "comfybot", about = "Generate an image grid through a ComfyUI backend")]
struct Args {
    /// Prompt text, options included (e.g. "a castle --width=768 --no blurry")
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    prompt: Vec<String>,

    /// Backend address (host:port)
    #[arg(long, env = "COMFYUI_ADDRESS", default_value = "127.0.0.1:8188")]
    comfy_address: String,

    /// Folder generated images are written to
    #[arg(long, env = "COMFYUI_FOLDER_PATH", default_value = "output")]
    output_folder: PathBuf,

    /// Public prefix substituted for the output folder in printed URLs
    #[arg(long, env = "COMFYUI_DOMAIN_PATH")]
    domain_prefix: Option<String>,

    /// Model configuration store
    #[arg(long, env = "MODEL_CONFIG_PATH", default_value = "modelConfiguration.json")]
    model_config: PathBuf,

    /// Workflow template document
    #[arg(long, env = "WORKFLOW_PATH", default_value = "workflows/sdxl.json")]
    workflow: PathBuf,

    /// Trigger token stripped from the prompt (prepended when absent)
    #[arg(long, env = "BOT_TRIGGER", default_value = "!generate")]
    trigger: String,

    /// Model used when the prompt names none
    #[arg(long, env = "DEFAULT_MODEL", default_value = "paSanctuary")]
    default_model: String,

    /// Seconds to wait for each streamed frame
    #[arg(long, default_value_t = 120)]
    receive_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comfybot=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = BotConfig {
        comfy_address: args.comfy_address,
        output_folder: args.output_folder,
        domain_prefix: args.domain_prefix,
        model_config_path: args.model_config,
        workflow_path: args.workflow,
        trigger: args.trigger,
        default_model: args.default_model,
        receive_timeout: Duration::from_secs(args.receive_timeout),
    };

    let mut text = args.prompt.join(" ");
    if !text.contains(&config.trigger) {
        text = format!("{} {text}", config.trigger);
    }

    tracing::info!(backend = %config.comfy_address, "Starting one-shot generation");

    let dispatcher = Dispatcher::new(&config);
    let grid_path = dispatcher.run_pipeline(&text).await?;

    let store = FileStore::new(&config.output_folder, config.domain_prefix.clone());
    match store.public_url(&grid_path) {
        Ok(url) => println!("{url}"),
        Err(_) => println!("{}", grid_path.display()),
    }

    Ok(())
}
