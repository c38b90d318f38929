//! StratoFlow Cloud Infrastructure
//!
//! This crate provides the provider abstraction and the plan/apply engine
//! for StratoFlow, enabling declarative management of cloud resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  StratoFlow CLI                  │
//! │            (strato plan / apply / ...)           │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stratoflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Engine (validate/plan/apply/destroy)    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider / Resource / Data    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │   Schema   │ │   Waiter   │ │ State Mgmt │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │     civo      │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod action;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod naming;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod resource_data;
pub mod schema;
pub mod state;
pub mod validation;
pub mod waiter;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use engine::{Engine, RefreshReport, evaluate_outputs};
pub use error::{CloudError, Result};
pub use naming::random_name;
pub use provider::{AuthStatus, CloudProvider, RetryConfig};
pub use reconcile::{SetDiff, diff_sets};
pub use resource::{DataSource, Resource};
pub use resource_data::{DEFAULT_TIMEOUT, ResourceData};
pub use schema::{Attribute, AttributeChange, AttributeType, Schema, Validator};
pub use state::{
    GlobalState, OutputState, ResourceState, ResourceStatus, StateLock, StateManager,
};
pub use waiter::{RetryError, StateChangeConf, retry, wait_until_gone};
