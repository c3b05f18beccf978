//! Discord channel source using the REST API

use crate::wire::{ApiError, RawChannel, order_guild_channels};
use anyhow::{Result, anyhow};
use dcexport_core::{Channel, ChannelFeed, ChannelSource, Scope};
use futures_util::{StreamExt, future, stream};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Lists guild and direct message channels over HTTP.
///
/// A single request is made per feed. Failures are reported once through the
/// feed and never retried.
pub struct DiscordChannelSource {
    client: reqwest::Client,
    token: String,
    bot: bool,
    base_url: String,
}

impl DiscordChannelSource {
    /// Create a new channel source
    ///
    /// # Arguments
    /// * `token` - Bot token, sent as `Bot <token>` unless [`Self::as_user`] is used
    pub fn new(token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("dcexport/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token,
            bot: true,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send the token without the `Bot` prefix
    pub fn as_user(mut self) -> Self {
        self.bot = false;
        self
    }

    fn authorization(&self) -> String {
        let token = self.token.trim();
        if !self.bot || token.starts_with("Bot ") || token.starts_with("Bearer ") {
            token.to_string()
        } else {
            format!("Bot {}", token)
        }
    }

    fn endpoint(&self, scope: Scope) -> String {
        match scope {
            Scope::Guild(id) => format!("{}/guilds/{}/channels", self.base_url, id),
            Scope::DirectMessages => format!("{}/users/@me/channels", self.base_url),
        }
    }

    /// Fetch and normalize every channel of a scope
    async fn fetch_channels(&self, scope: Scope) -> Result<Vec<Channel>> {
        if self.token.trim().is_empty() {
            return Err(anyhow!("Discord token is empty"));
        }

        let url = self.endpoint(scope);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            warn!("Discord API returned {} for {}", status, scope);
            return Err(anyhow!("Discord API error {}: {}", status, detail));
        }

        let raw: Vec<RawChannel> = response.json().await?;
        let mut channels: Vec<Channel> = raw.into_iter().map(RawChannel::into_channel).collect();
        if let Scope::Guild(_) = scope {
            order_guild_channels(&mut channels);
        }

        info!("Discord returned {} channel(s) for {}", channels.len(), scope);
        Ok(channels)
    }
}

impl ChannelSource for DiscordChannelSource {
    fn channels<'a>(&'a self, scope: Scope, cancel: &'a CancellationToken) -> ChannelFeed<'a> {
        let fetch = async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Channel fetch for {} cancelled", scope);
                    Ok(Vec::new())
                }
                result = self.fetch_channels(scope) => result,
            }
        };

        stream::once(fetch)
            .flat_map(|result| match result {
                Ok(channels) => stream::iter(channels.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(future::ready(Err(e))).right_stream(),
            })
            .boxed()
    }
}
