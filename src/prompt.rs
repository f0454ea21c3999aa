//! Prompt extraction from chat text.
//!
//! A trigger message looks like:
//!
//!   !generate <positive_text> --width=<w> --height=<h> --model=<m> --no <negative_text>
//!
//! Segments are split on the literal `--` and matched in fixed precedence:
//! `width=`, `height=`, `model=`, then a bare `no` prefix. The `no` arm is
//! deliberately the most permissive match: any remaining segment that starts
//! with "no" (including `--nothing here`) is treated as negative text, so it
//! must stay last. Unrecognized segments are ignored.

/// Structured request extracted from one trigger message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredPrompt {
    /// Free text describing what to draw.
    pub positive: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub model: Option<String>,
    /// Free text describing what to avoid.
    pub negative: Option<String>,
}

/// Extract a [`FilteredPrompt`] from `raw`, which must contain `trigger`.
pub fn parse(raw: &str, trigger: &str) -> Result<FilteredPrompt, PromptError> {
    if trigger.is_empty() || !raw.contains(trigger) {
        return Err(PromptError::MissingTrigger);
    }

    let message = raw.replacen(trigger, "", 1);
    let mut segments = message.split("--");

    let mut filtered = FilteredPrompt {
        positive: segments.next().unwrap_or("").trim().to_string(),
        ..Default::default()
    };

    for segment in segments {
        if let Some(value) = segment.strip_prefix("width=") {
            filtered.width = Some(parse_dimension("width", value)?);
        } else if let Some(value) = segment.strip_prefix("height=") {
            filtered.height = Some(parse_dimension("height", value)?);
        } else if let Some(value) = segment.strip_prefix("model=") {
            filtered.model = Some(value.trim().to_string());
        } else if let Some(value) = segment.strip_prefix("no") {
            filtered.negative = Some(value.trim().to_string());
        }
    }

    Ok(filtered)
}

fn parse_dimension(field: &'static str, value: &str) -> Result<u32, PromptError> {
    value
        .trim()
        .parse()
        .map_err(|_| PromptError::InvalidDimension {
            field,
            value: value.trim().to_string(),
        })
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("message does not contain the trigger token")]
    MissingTrigger,
    #[error("{field} is not a number: {value:?}")]
    InvalidDimension { field: &'static str, value: String },
}
