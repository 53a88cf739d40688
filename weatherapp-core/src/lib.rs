//! Core library for the `weatherapp` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather service client behind the [`WeatherProvider`] seam
//! - An observable three-state result slot ([`ResultState`], [`StateWatcher`])
//! - The fetch controller that drives the slot ([`WeatherController`])
//!
//! It is used by `weatherapp-cli`, but any front end can subscribe to a
//! controller and render its state.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod state;

pub use config::Config;
pub use controller::{
    ControllerOptions, IncompletePolicy, LOAD_FAILED, ResponseOrdering, WeatherController,
};
pub use error::ProviderError;
pub use model::{Condition, Current, Location, WeatherPayload};
pub use provider::{ProviderReply, WeatherProvider, provider_from_config};
pub use state::{ResultState, Snapshot, StateWatcher};
