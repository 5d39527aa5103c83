//! The generative port: the single seam through which anything in the
//! suite talks to a language model.
//!
//! The port is optional everywhere. A service without one (or with a
//! failing one) still answers every operation from local heuristics.

use async_trait::async_trait;

use crate::error::AiError;

#[async_trait]
pub trait GenerativePort: Send + Sync {
    /// One-shot generation. `context` frames the model's role and gets the
    /// relevant data; `prompt` carries the actual ask.
    async fn generate(&self, context: &str, prompt: &str) -> Result<String, AiError>;
}
