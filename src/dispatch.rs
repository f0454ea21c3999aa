//! Command dispatch for trigger-tagged chat messages.
//!
//! Stateless per invocation: classify the message, run the matching flow,
//! translate the outcome into chat replies. Help and model listings go to
//! the requesting user privately; generation results (and errors) go to the
//! shared channel addressed by nick, since others may want to see them.

use crate::chat::{ChatMessage, ChatTransport};
use crate::comfy::ComfyClient;
use crate::config::BotConfig;
use crate::files::FileStore;
use crate::grid;
use crate::models::ModelLibrary;
use crate::prompt;
use crate::workflow::WorkflowTemplate;

/// What a trigger message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Models,
    Generate,
}

impl Command {
    /// Ordered rules: help beats models beats generate, so a prompt that
    /// mentions `--help` anywhere is a help request.
    pub fn classify(text: &str) -> Command {
        if text.contains("--help") {
            Command::Help
        } else if text.contains("--models") {
            Command::Models
        } else {
            Command::Generate
        }
    }
}

/// Help lines sent privately on `--help`.
fn help_lines(trigger: &str) -> [String; 3] {
    [
        format!("To generate an image, type: {trigger} <your_prompt>"),
        format!(
            "Prompt structure: '{trigger}' <positive_text> --width=<w> --height=<h> --model=<m> --no <negative_text>"
        ),
        "Example: a beautiful landscape --width=1024 --height=768 --model=epicMode --no ugly, blurry"
            .to_string(),
    ]
}

/// One dispatcher serves every trigger message for the process.
pub struct Dispatcher<'a> {
    config: &'a BotConfig,
    client: ComfyClient,
    store: FileStore,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a BotConfig) -> Self {
        Self {
            client: ComfyClient::new(&config.comfy_address, config.receive_timeout),
            store: FileStore::new(&config.output_folder, config.domain_prefix.clone()),
            config,
        }
    }

    /// Handle one trigger-tagged message end to end.
    pub async fn handle_message(
        &self,
        transport: &dyn ChatTransport,
        msg: &ChatMessage,
    ) -> anyhow::Result<()> {
        match Command::classify(&msg.text) {
            Command::Help => self.send_help(transport, &msg.from).await,
            Command::Models => self.send_models(transport, &msg.from).await,
            Command::Generate => self.generate(transport, msg).await,
        }
    }

    async fn send_help(
        &self,
        transport: &dyn ChatTransport,
        user: &str,
    ) -> anyhow::Result<()> {
        for line in help_lines(&self.config.trigger) {
            transport.notice(user, &line).await?;
        }
        Ok(())
    }

    async fn send_models(
        &self,
        transport: &dyn ChatTransport,
        user: &str,
    ) -> anyhow::Result<()> {
        match ModelLibrary::load(&self.config.model_config_path) {
            Ok(library) => {
                transport
                    .notice(user, &format!("Available models: {}", library.model_names()))
                    .await
            }
            Err(e) => {
                tracing::error!(error = %e, "Model listing failed");
                transport
                    .notice(user, &format!("Error getting models: {e}"))
                    .await
            }
        }
    }

    async fn generate(
        &self,
        transport: &dyn ChatTransport,
        msg: &ChatMessage,
    ) -> anyhow::Result<()> {
        let outcome = async {
            let grid_path = self.run_pipeline(&msg.text).await?;
            self.store
                .public_url(&grid_path)
                .map_err(anyhow::Error::from)
        }
        .await;

        match outcome {
            Ok(url) => {
                transport
                    .deliver(&msg.channel, &format!("{}: Your image is ready! {url}", msg.from))
                    .await
            }
            Err(e) => {
                tracing::error!(error = ?e, user = %msg.from, "Image generation failed");
                transport
                    .deliver(
                        &msg.channel,
                        &format!("{}: An error occurred during image generation: {e}", msg.from),
                    )
                    .await
            }
        }
    }

    /// parse → resolve → build → generate → composite. Returns the local
    /// composite path; callers map it to a public URL where needed.
    pub async fn run_pipeline(&self, text: &str) -> anyhow::Result<std::path::PathBuf> {
        let filtered = prompt::parse(text, &self.config.trigger)?;
        tracing::info!(prompt = %filtered.positive, model = ?filtered.model, "Generation requested");

        let library = ModelLibrary::load(&self.config.model_config_path)?;
        let model = library.resolve(
            filtered.model.as_deref().unwrap_or(""),
            &self.config.default_model,
        )?;

        let template = WorkflowTemplate::load(&self.config.workflow_path)?;
        let workflow = template.build(model, &filtered);

        let saved = self.client.generate(&workflow, &self.store).await?;
        Ok(grid::composite(&saved)?)
    }
}
