//! ComfyUI backend client.
//!
//! One generation is a queue-and-stream exchange: POST the workflow document
//! to `/prompt`, then read the websocket tagged with our client id. Control
//! frames track which node is executing; binary frames carry image payloads,
//! kept only while the websocket output node is the active one. The terminal
//! control frame (`node: null` for our prompt id) ends collection.

use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::files::{FileStore, FilesError};
use crate::workflow::Workflow;

/// Node whose binary frames are the images we keep.
const OUTPUT_NODE: &str = "SaveImageWebsocket";

/// Opaque header prefixed to every binary frame.
const BINARY_HEADER_LEN: usize = 8;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client for one backend instance.
///
/// A fresh `client_id` is minted per process, so the websocket only carries
/// events for our own submissions.
pub struct ComfyClient {
    address: String,
    client_id: String,
    http: reqwest::Client,
    receive_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

/// Control frame shape. Only `executing` frames are acted on.
#[derive(Debug, Deserialize)]
struct ControlFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: ControlData,
}

#[derive(Debug, Default, Deserialize)]
struct ControlData {
    node: Option<String>,
    prompt_id: Option<String>,
}

impl ComfyClient {
    pub fn new(address: &str, receive_timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            client_id: Uuid::new_v4().to_string(),
            http: reqwest::Client::new(),
            receive_timeout,
        }
    }

    /// Run one full generation: submit, stream, persist.
    ///
    /// Returns the saved image paths in generation order. The websocket is
    /// closed on every exit path; a stream failure drops any payloads already
    /// received rather than surfacing a partial batch. Per-file persist
    /// failures are the one exception: they are skipped, not fatal.
    pub async fn generate(
        &self,
        workflow: &Workflow,
        store: &FileStore,
    ) -> Result<Vec<PathBuf>, GenerateError> {
        let prompt_id = self.queue_prompt(workflow).await?;
        tracing::info!(prompt_id = %prompt_id, seed = workflow.seed(), "Prompt queued");

        let url = format!("ws://{}/ws?clientId={}", self.address, self.client_id);
        let (mut ws, _) = connect_async(url.as_str())
            .await
            .map_err(|source| GenerateError::Connect {
                address: self.address.clone(),
                source,
            })?;

        let collected = self.collect_images(&mut ws, &prompt_id).await;
        if let Err(e) = ws.close(None).await {
            tracing::debug!(error = %e, "Websocket close failed");
        }
        let images = collected?;
        tracing::info!(count = images.len(), "Image retrieval complete");

        Ok(store.save_images(&images, workflow.seed()).await?)
    }

    /// POST the request document to the backend's queue endpoint.
    async fn queue_prompt(&self, workflow: &Workflow) -> Result<String, GenerateError> {
        let body = serde_json::json!({
            "prompt": workflow.document(),
            "client_id": self.client_id,
        });
        let resp = self
            .http
            .post(format!("http://{}/prompt", self.address))
            .json(&body)
            .send()
            .await
            .map_err(GenerateError::Submit)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerateError::SubmitStatus(status));
        }
        let queued: QueueResponse = resp.json().await.map_err(GenerateError::Submit)?;
        Ok(queued.prompt_id)
    }

    /// Receive frames until the terminal control frame for `prompt_id`.
    async fn collect_images(
        &self,
        ws: &mut WsStream,
        prompt_id: &str,
    ) -> Result<Vec<Vec<u8>>, GenerateError> {
        let mut images: Vec<Vec<u8>> = Vec::new();
        let mut current_node = String::new();

        loop {
            let frame = tokio::time::timeout(self.receive_timeout, ws.next())
                .await
                .map_err(|_| GenerateError::StreamTimeout(self.receive_timeout))?
                .ok_or(GenerateError::StreamClosed)?
                .map_err(GenerateError::Stream)?;

            match frame {
                Message::Text(text) => {
                    let control: ControlFrame = serde_json::from_str(text.as_str())
                        .map_err(GenerateError::BadControlFrame)?;
                    if control.kind != "executing"
                        || control.data.prompt_id.as_deref() != Some(prompt_id)
                    {
                        continue;
                    }
                    match control.data.node {
                        // node null for our prompt id means execution is done
                        None => break,
                        Some(node) => {
                            tracing::debug!(node = %node, "Executing");
                            current_node = node;
                        }
                    }
                }
                Message::Binary(payload) => {
                    if current_node != OUTPUT_NODE {
                        continue;
                    }
                    if payload.len() < BINARY_HEADER_LEN {
                        return Err(GenerateError::ShortBinaryFrame(payload.len()));
                    }
                    images.push(payload[BINARY_HEADER_LEN..].to_vec());
                }
                Message::Close(_) => return Err(GenerateError::StreamClosed),
                // ping/pong handled by the library
                _ => {}
            }
        }

        Ok(images)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to submit prompt to the backend")]
    Submit(#[source] reqwest::Error),
    #[error("backend rejected the prompt: HTTP {0}")]
    SubmitStatus(reqwest::StatusCode),
    #[error("could not connect to the backend websocket at {address}")]
    Connect {
        address: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("timed out after {0:?} waiting for a frame")]
    StreamTimeout(Duration),
    #[error("stream error while collecting images")]
    Stream(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("stream closed before generation finished")]
    StreamClosed,
    #[error("malformed control frame")]
    BadControlFrame(#[source] serde_json::Error),
    #[error("binary frame of {0} bytes is shorter than its header")]
    ShortBinaryFrame(usize),
    #[error(transparent)]
    Files(#[from] FilesError),
}
