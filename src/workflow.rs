//! Workflow template handling.
//!
//! The backend's pipeline is a JSON graph of named sections ("Checkpoint",
//! "KSampler", …), each with an `inputs` object. [`WorkflowTemplate`] is a
//! validated view over that document: every section the builder writes to is
//! checked once at load, so a template edit that drops one fails before any
//! request is queued. [`WorkflowTemplate::build`] copies the template and
//! overwrites the resolved fields, producing one fresh [`Workflow`] per
//! request.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;

use crate::models::ModelConfig;
use crate::prompt::FilteredPrompt;

/// Safety terms always prepended to the negative prompt.
const NEGATIVE_SAFETY_PREFIX: &str = "nsfw, nude";

/// Images per request when the model config leaves batch size unset.
const DEFAULT_BATCH_SIZE: u32 = 4;

/// Sections the builder overwrites. Checked at template load.
const REQUIRED_SECTIONS: [&str; 6] = [
    "Checkpoint",
    "VAELoader",
    "KSampler",
    "EmptyLatentImage",
    "PositivePrompt",
    "NegativePrompt",
];

/// A validated workflow template document.
#[derive(Debug, Clone)]
pub struct WorkflowTemplate {
    doc: Value,
}

impl WorkflowTemplate {
    /// Read and validate the template at `path`.
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let raw =
            std::fs::read_to_string(path).map_err(|source| WorkflowError::TemplateNotFound {
                path: path.to_path_buf(),
                source,
            })?;
        let doc = serde_json::from_str(&raw).map_err(|source| WorkflowError::TemplateMalformed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(doc)
    }

    /// Wrap an already-parsed template document, verifying that every section
    /// the builder writes to exists and has an `inputs` object.
    pub fn from_value(doc: Value) -> Result<Self, WorkflowError> {
        for section in REQUIRED_SECTIONS {
            let inputs = doc.get(section).and_then(|s| s.get("inputs"));
            if !inputs.is_some_and(Value::is_object) {
                return Err(WorkflowError::MissingSection(section));
            }
        }
        Ok(Self { doc })
    }

    /// Copy the template and fill in model defaults and prompt overrides.
    ///
    /// Prompt fields win over model defaults; prompt texts are appended to the
    /// model's default prompts. Each call draws a fresh seed; the request is
    /// never shared or reused.
    pub fn build(&self, model: &ModelConfig, prompt: &FilteredPrompt) -> Workflow {
        let seed = rand::thread_rng().gen_range(1..=1_000_000u64);
        let mut workflow = Workflow {
            doc: self.doc.clone(),
            seed,
        };

        workflow.set("Checkpoint", "ckpt_name", model.checkpoint_name.as_str().into());
        workflow.set("VAELoader", "vae_name", model.vae.as_str().into());
        workflow.set("KSampler", "seed", seed.into());
        workflow.set("KSampler", "steps", model.steps.into());
        workflow.set(
            "EmptyLatentImage",
            "width",
            prompt.width.unwrap_or(model.image_width).into(),
        );
        workflow.set(
            "EmptyLatentImage",
            "height",
            prompt.height.unwrap_or(model.image_height).into(),
        );
        workflow.set(
            "EmptyLatentImage",
            "batch_size",
            model.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).into(),
        );

        let positive = join_terms(&[&model.default_positive_prompt, &prompt.positive]);
        workflow.set("PositivePrompt", "text", positive.into());

        let negative = join_terms(&[
            NEGATIVE_SAFETY_PREFIX,
            &model.default_negative_prompt,
            prompt.negative.as_deref().unwrap_or(""),
        ]);
        workflow.set("NegativePrompt", "text", negative.into());

        workflow
    }
}

/// A filled-in generation request document.
#[derive(Debug, Clone)]
pub struct Workflow {
    doc: Value,
    seed: u64,
}

impl Workflow {
    /// The sampler seed, also the run identifier in filenames and replies.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The request document, ready to submit.
    pub fn document(&self) -> &Value {
        &self.doc
    }

    fn set(&mut self, section: &str, field: &str, value: Value) {
        // Sections were validated when the template was loaded.
        if let Some(inputs) = self
            .doc
            .get_mut(section)
            .and_then(|s| s.get_mut("inputs"))
            .and_then(Value::as_object_mut)
        {
            inputs.insert(field.to_string(), value);
        }
    }
}

/// Comma-join the non-empty entries.
fn join_terms(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow template not found at {}", path.display())]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("workflow template at {} is not valid JSON", path.display())]
    TemplateMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("workflow template is missing section {0:?}")]
    MissingSection(&'static str),
}
