//! Application state shared across request handlers.

use crate::config::Config;
use crate::draft::Drafter;
use crate::email::Mailer;
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound provider clients, shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub drafter: Arc<Drafter>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    /// Build the state from configuration, logging which optional
    /// integrations are enabled.
    pub fn from_config(config: &Config) -> Self {
        let drafter = Drafter::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
        );
        let mailer = Mailer::new(
            config.email_api_key.clone(),
            config.email_from.clone(),
            config.email_base_url.clone(),
        );

        if drafter.is_configured() {
            info!("Completion provider configured");
        } else {
            warn!("Completion provider not configured - drafting disabled");
        }
        if mailer.is_configured() {
            info!("Email provider configured");
        } else {
            warn!("Email provider not configured - email relay disabled");
        }

        Self {
            drafter: Arc::new(drafter),
            mailer: Arc::new(mailer),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
