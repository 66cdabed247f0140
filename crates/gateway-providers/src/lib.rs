//! # Gateway Providers
//!
//! Agent platform implementations for the invoice gateway.
//!
//! - [`AzureAgentsClient`]: Azure AI Foundry Agent Service over REST
//! - [`CredentialChain`]: bearer tokens from a static token, a service
//!   principal secret, or a managed identity

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;

#[cfg(feature = "azure")]
pub mod azure_agents;

pub use credential::{
    AccessToken, ClientSecretCredential, CredentialChain, ManagedIdentityCredential,
    StaticTokenCredential, TokenCredential, AI_SCOPE,
};

#[cfg(feature = "azure")]
pub use azure_agents::{AzureAgentsClient, AzureAgentsConfig, DEFAULT_API_VERSION};
