use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Broadcasts toasts to every subscribed view. Toasts pushed while nobody is
/// subscribed are dropped.
pub struct ToastQueue {
    events: broadcast::Sender<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.events.subscribe()
    }

    fn push(&self, level: ToastLevel, message: &str) {
        let _ = self.events.send(Toast {
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        });
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastQueue {
    fn notify_success(&self, message: &str) {
        self.push(ToastLevel::Success, message);
    }

    fn notify_error(&self, message: &str) {
        self.push(ToastLevel::Error, message);
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, message: &str) {
        info!(%message, "notification");
    }

    fn notify_error(&self, message: &str) {
        warn!(%message, "error notification");
    }
}
