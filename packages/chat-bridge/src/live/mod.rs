//! Stream liveness notifier.
//!
//! Polls each configured channel page, matches a "live" pattern against the
//! body and announces a channel only on the not-live → live edge. A failed
//! fetch leaves the stored state alone.

pub mod config;

use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;

pub use config::{ChannelTarget, NotificationConfig, PlatformConfig};

use crate::cache::LiveStates;
use crate::error::Result;
use crate::host::BridgeContext;
use crate::scheduler::{BridgeState, PollTask, TaskProbe, Tick};
use crate::template::fill;

/// One channel to watch, with its patterns compiled.
#[derive(Debug, Clone)]
pub struct ChannelWatch {
    pub platform: &'static str,
    pub name: String,
    pub url: String,
    live: Option<Regex>,
    title: Option<Regex>,
}

impl ChannelWatch {
    pub fn new(platform: &'static str, name: &str, url: &str, live_regex: &str, title_regex: &str) -> Self {
        Self {
            platform,
            name: name.to_string(),
            url: url.trim().to_string(),
            live: compile(live_regex),
            title: compile(title_regex),
        }
    }

    pub fn key(&self) -> String {
        LiveStates::key(self.platform, &self.name)
    }

    /// Record the state seen in `body` and return the rendered
    /// announcement if the channel just went live.
    pub fn evaluate(&self, states: &LiveStates, body: &str, format: &str) -> Option<String> {
        let live = is_live(body, self.live.as_ref());
        if !states.observe(&self.key(), live) {
            return None;
        }
        let title = extract_title(body, self.title.as_ref());
        Some(fill(
            format,
            &[
                ("platform", self.platform),
                ("name", &self.name),
                ("url", &self.url),
                ("title", title.as_deref().unwrap_or(&self.name)),
            ],
        ))
    }

    /// Evaluate one fetch result. A failed fetch is logged and changes
    /// nothing, so no edge is inferred from it.
    pub fn settle(&self, states: &LiveStates, page: Result<String>, format: &str, tick: u64) -> Option<String> {
        match page {
            Ok(body) => self.evaluate(states, &body, format),
            Err(e) => {
                tracing::debug!(
                    tick,
                    platform = self.platform,
                    channel = self.name.as_str(),
                    error = %e,
                    "[Live] Page fetch failed"
                );
                None
            }
        }
    }
}

/// Blank or invalid patterns compile to `None`.
fn compile(pattern: &str) -> Option<Regex> {
    if pattern.trim().is_empty() {
        return None;
    }
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "[Live] Ignoring invalid pattern");
            None
        }
    }
}

/// First match anywhere in the body means live. No pattern means not live.
pub fn is_live(body: &str, pattern: Option<&Regex>) -> bool {
    pattern.is_some_and(|re| re.is_match(body))
}

/// First capture group of the first match, if any.
pub fn extract_title(body: &str, pattern: Option<&Regex>) -> Option<String> {
    pattern?
        .captures(body)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Flatten the config into watches, in platform order. Disabled platforms
/// and channels without a URL are left out.
pub fn watch_list(config: &NotificationConfig) -> Vec<ChannelWatch> {
    let mut watches = Vec::new();
    for (platform, settings) in config.platforms() {
        if !settings.enabled {
            continue;
        }
        for channel in &settings.channels {
            if channel.url.trim().is_empty() {
                continue;
            }
            watches.push(ChannelWatch::new(
                platform,
                &channel.name,
                &channel.url,
                channel.live_regex(settings),
                channel.title_regex(settings),
            ));
        }
    }
    watches
}

pub struct LiveNotifier {
    ctx: BridgeContext,
    states: Arc<LiveStates>,
    task: Option<PollTask>,
}

impl LiveNotifier {
    pub fn start(config: NotificationConfig, ctx: BridgeContext) -> Self {
        let states = Arc::new(LiveStates::new());

        let task = match config.validate() {
            Ok(()) => {
                let watches = Arc::new(watch_list(&config));
                let format = Arc::new(config.message_format.clone());
                tracing::info!(
                    channels = watches.len(),
                    interval_secs = config.poll_interval().as_secs(),
                    "[Live] Notifier started"
                );
                let (c, st) = (ctx.clone(), states.clone());
                Some(PollTask::spawn(
                    "live",
                    config::WARMUP,
                    config.poll_interval(),
                    move |tick| poll_once(watches.clone(), format.clone(), c.clone(), st.clone(), tick),
                ))
            }
            Err(e) => {
                tracing::info!(reason = %e, "[Live] Notifier not started");
                None
            }
        };

        Self { ctx, states, task }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn state(&self) -> BridgeState {
        self.task.as_ref().map_or(BridgeState::Stopped, |t| t.state())
    }

    pub fn probe(&self) -> Option<TaskProbe> {
        self.task.as_ref().map(|t| t.probe())
    }

    /// Channels currently known to be live.
    pub fn live_count(&self) -> usize {
        self.states.live_count()
    }

    /// Stop, then start again from `config`. Every channel starts out
    /// not live, so a channel that is live now is announced again.
    pub fn reconfigure(self, config: NotificationConfig) -> Self {
        let ctx = self.ctx.clone();
        self.stop();
        Self::start(config, ctx)
    }

    pub fn stop(self) {
        if let Some(task) = self.task {
            task.stop();
            tracing::info!("[Live] Notifier stopped");
        }
    }
}

async fn poll_once(
    watches: Arc<Vec<ChannelWatch>>,
    format: Arc<String>,
    ctx: BridgeContext,
    states: Arc<LiveStates>,
    tick: Tick,
) {
    let fetcher = &ctx.fetcher;
    let pages = join_all(watches.iter().map(|watch| async move {
        let request = fetcher.get(&watch.url, config::PAGE_TIMEOUT);
        (watch, fetcher.send_text(request).await)
    }))
    .await;

    tick.applying();
    for (watch, page) in pages {
        if let Some(text) = watch.settle(&states, page, &format, tick.number) {
            tracing::info!(platform = watch.platform, channel = watch.name.as_str(), "[Live] Channel went live");
            ctx.host.present(text);
        }
    }
}
