//! comfybot: IRC-channel front-end core for a ComfyUI image backend.
//!
//! Turns trigger-tagged chat messages into workflow documents, drives the
//! backend's queue-and-stream protocol, and posts a composite grid of the
//! results back to the channel. The IRC line protocol itself is out of
//! scope: the dispatcher speaks through [`chat::ChatTransport`], and the
//! shipped binary drives the pipeline directly from the command line.

pub mod chat;
pub mod comfy;
pub mod config;
pub mod dispatch;
pub mod files;
pub mod grid;
pub mod models;
pub mod prompt;
pub mod workflow;
