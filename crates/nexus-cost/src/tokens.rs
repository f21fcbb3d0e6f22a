// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt token estimation with tiktoken encodings.
//!
//! Each message costs its content tokens plus its role tokens plus a fixed
//! overhead of 4; every request adds 3 for the primed assistant reply.

use std::collections::HashMap;

use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};
use tracing::debug;

use nexus_config::model::TokenizerConfig;
use nexus_core::NexusError;
use nexus_core::TokenCounter;
use nexus_core::types::Message;

/// Per-message overhead for the chat framing tokens.
pub const TOKENS_PER_MESSAGE: u64 = 4;

/// Per-request overhead for the primed assistant reply.
pub const TOKENS_PER_REQUEST: u64 = 3;

/// A BPE encoding bundled with tiktoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    O200kBase,
    Cl100kBase,
    P50kBase,
    R50kBase,
}

impl Encoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "o200k_base" => Some(Self::O200kBase),
            "cl100k_base" => Some(Self::Cl100kBase),
            "p50k_base" => Some(Self::P50kBase),
            "r50k_base" => Some(Self::R50kBase),
            _ => None,
        }
    }

    fn from_tokenizer(tokenizer: Tokenizer) -> Self {
        match tokenizer {
            Tokenizer::Cl100kBase => Self::Cl100kBase,
            Tokenizer::P50kBase | Tokenizer::P50kEdit => Self::P50kBase,
            Tokenizer::R50kBase | Tokenizer::Gpt2 => Self::R50kBase,
            // o200k and its harmony variant share ordinary-text ranks.
            _ => Self::O200kBase,
        }
    }

    /// Loaded once per process; the first call for an encoding takes a while.
    fn bpe(self) -> &'static CoreBPE {
        match self {
            Self::O200kBase => tiktoken_rs::o200k_base_singleton(),
            Self::Cl100kBase => tiktoken_rs::cl100k_base_singleton(),
            Self::P50kBase => tiktoken_rs::p50k_base_singleton(),
            Self::R50kBase => tiktoken_rs::r50k_base_singleton(),
        }
    }
}

/// [`TokenCounter`] backed by tiktoken.
///
/// Resolution order for a model name: configured alias, tiktoken's own model
/// table, then the configured default encoding. A model matching none of
/// these is unsupported.
#[derive(Debug, Clone, Default)]
pub struct TiktokenCounter {
    aliases: HashMap<String, Encoding>,
    default_encoding: Option<Encoding>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TokenizerConfig) -> Result<Self, NexusError> {
        let mut counter = Self::new();
        for (model, name) in &config.model_aliases {
            counter = counter.with_alias(model, name)?;
        }
        if let Some(name) = &config.default_encoding {
            counter.default_encoding = Some(parse_encoding(name)?);
        }
        Ok(counter)
    }

    /// Maps `model` to the named encoding.
    pub fn with_alias(mut self, model: &str, encoding: &str) -> Result<Self, NexusError> {
        self.aliases
            .insert(model.to_string(), parse_encoding(encoding)?);
        Ok(self)
    }

    /// Encoding for `model`, if any.
    pub fn resolve(&self, model: &str) -> Option<Encoding> {
        self.aliases
            .get(model)
            .copied()
            .or_else(|| get_tokenizer(model).map(Encoding::from_tokenizer))
            .or(self.default_encoding)
    }

    /// Loads the encodings this counter can resolve to, outside the request path.
    pub fn preload(&self) {
        let mut encodings: Vec<Encoding> = self.aliases.values().copied().collect();
        encodings.extend(self.default_encoding);
        encodings.push(Encoding::O200kBase);
        for encoding in encodings {
            let _ = encoding.bpe();
        }
    }
}

fn parse_encoding(name: &str) -> Result<Encoding, NexusError> {
    Encoding::from_name(name)
        .ok_or_else(|| NexusError::Config(format!("unknown tokenizer encoding `{name}`")))
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, messages: &[Message], model: &str) -> Result<u64, NexusError> {
        let encoding = self
            .resolve(model)
            .ok_or_else(|| NexusError::UnsupportedModel {
                model: model.to_string(),
            })?;
        let bpe = encoding.bpe();

        let mut total = TOKENS_PER_REQUEST;
        for message in messages {
            total += TOKENS_PER_MESSAGE;
            total += bpe.encode_ordinary(message.role.to_string().as_str()).len() as u64;
            total += bpe.encode_ordinary(&message.content).len() as u64;
        }
        debug!(model, ?encoding, messages = messages.len(), tokens = total, "counted prompt tokens");
        Ok(total)
    }
}
