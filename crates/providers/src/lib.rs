//! Embedding and completion adapters (§4.3, §4.4): thin, swappable
//! text-to-vector and prompt-to-text wrappers over a remote generative
//! provider. Neither adapter retries or trips breakers itself — that is the
//! resilience layer's job, composed at the orchestrator's call site.

pub mod completion;
pub mod config;
pub mod embedding;

pub use completion::{CompletionAdapter, CompletionParams, HttpCompletionAdapter, StubCompletionAdapter, FALLBACK_RATIONALE};
pub use config::{CompletionConfig, EmbeddingConfig, ProviderKind};
pub use embedding::{EmbeddingAdapter, HttpEmbeddingAdapter, StubEmbeddingAdapter};
