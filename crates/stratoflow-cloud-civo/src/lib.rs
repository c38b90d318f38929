//! Civo provider for StratoFlow
//!
//! This crate implements the `CloudProvider` trait for Civo, talking to the
//! Civo REST API (`https://api.civo.com/v2`) directly.
//!
//! # Features
//!
//! - Networks, firewalls (with rule set reconciliation), instances
//! - Volumes and volume attachments
//! - Object stores, SSH keys, DNS domains and records
//! - Lookups of existing objects, sizes and disk images as data sources
//!
//! # Configuration
//!
//! ```kdl
//! provider "civo" {
//!     region "LON1"
//! }
//! ```
//!
//! The token is taken from the `token` argument, `CIVO_TOKEN`, or the active
//! profile of `~/.config/stratoflow/credentials.json`, in that order.
//!
//! # Example
//!
//! ```ignore
//! use stratoflow_cloud::{CloudProvider, Engine};
//! use stratoflow_cloud_civo::CivoProvider;
//!
//! let provider = CivoProvider::configure(&provider_block.config)?;
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     anyhow::bail!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let engine = Engine::new().with_provider(Arc::new(provider));
//! let plan = engine.plan(&stack, &state).await?;
//! ```

pub mod client;
pub mod data_sources;
pub mod error;
pub mod models;
pub mod provider;
pub mod resources;

pub use client::{CivoClient, ClientConfig, DEFAULT_API_URL, DEFAULT_REGION};
pub use error::{CivoError, Result};
pub use provider::{API_URL_ENV, CivoProvider, REGION_ENV, TOKEN_ENV, client_config, provider_schema};
