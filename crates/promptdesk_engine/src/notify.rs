use std::sync::mpsc;

use promptdesk_core::Notification;
use promptdesk_logging::desk_debug;

/// Receives user-visible notifications (toasts).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

pub struct ChannelNotificationSink {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotificationSink {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notification: &Notification) {
        if self.tx.send(notification.clone()).is_err() {
            desk_debug!("notification receiver gone; dropping {:?}", notification);
        }
    }
}
