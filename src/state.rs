//! Shared application state handed to every handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::db::Store;
use crate::media::MediaClient;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub throttle: Arc<LoginThrottle>,
    pub notifier: Notifier,
    pub media: Option<Arc<MediaClient>>,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        let media = config.media.clone().and_then(|media| match MediaClient::new(media) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::error!(error = %e, "media client disabled");
                None
            }
        });
        Self {
            store,
            throttle: Arc::new(LoginThrottle::new(
                config.login_max_attempts,
                config.login_window,
            )),
            notifier: Notifier::new(config.contact_webhook.clone()),
            media,
            config: Arc::new(config),
        }
    }
}

/// Per-IP login attempt limiter over a sliding window.
#[derive(Debug)]
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    attempts: RwLock<HashMap<String, Vec<Instant>>>,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Records an attempt; `false` once the client has used up its window.
    pub async fn allow(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        // Evict expired entries so the map tracks only active clients.
        attempts.retain(|_, seen| {
            seen.retain(|t| now.duration_since(*t) < self.window);
            !seen.is_empty()
        });

        let seen = attempts.entry(ip.to_string()).or_default();
        if seen.len() >= self.max_attempts as usize {
            return false;
        }
        seen.push(now);
        true
    }

    /// A successful login clears the client's history.
    pub async fn reset(&self, ip: &str) {
        self.attempts.write().await.remove(ip);
    }
}
