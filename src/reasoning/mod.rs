//! Root-cause reasoning through an external text generation service.
//!
//! The generator is injected as a [`TextGenerator`]. Every call goes through
//! [`generate_or_fallback`], which bounds the wait and converts any failure
//! into a fixed fallback sentence so the pipeline never aborts here.

pub mod openrouter;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::analysis::{LogAnalysis, MetricsAnalysis};

pub use openrouter::{ChatCompletionsClient, DisabledGenerator};

pub const ROOT_CAUSE_FALLBACK: &str = "Root cause analysis unavailable due to AI service error";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("text generation service returned no content")]
    EmptyResponse,

    #[error("text generation is disabled (no API key configured)")]
    Disabled,
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Produces one natural-language answer for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerateError>;
}

/// Call `generator` with a bounded wait. Errors and timeouts yield `fallback`.
pub async fn generate_or_fallback(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
    timeout: Duration,
    fallback: &str,
) -> String {
    let result = match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(GenerateError::Timeout(timeout)),
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Text generation failed, using fallback");
            fallback.to_string()
        }
    }
}

pub fn root_cause_prompt(metrics: &MetricsAnalysis, logs: &LogAnalysis) -> Prompt {
    let text = format!(
        "You are a Site Reliability Engineer.\n\n\
         Based ONLY on the facts below, determine the most likely root cause.\n\
         Return ONE concise sentence.\n\
         Do NOT suggest actions.\n\
         Do NOT speculate beyond the facts.\n\n\
         Metrics analysis:\n{}\n\n\
         Log analysis:\n{}\n",
        to_json(metrics),
        to_json(logs),
    );
    Prompt {
        text,
        temperature: 0.1,
        max_tokens: 100,
    }
}

/// Ask the generator for a one-sentence root cause.
pub async fn determine_root_cause(
    generator: &dyn TextGenerator,
    metrics: &MetricsAnalysis,
    logs: &LogAnalysis,
    timeout: Duration,
) -> String {
    let prompt = root_cause_prompt(metrics, logs);
    generate_or_fallback(generator, &prompt, timeout, ROOT_CAUSE_FALLBACK).await
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
