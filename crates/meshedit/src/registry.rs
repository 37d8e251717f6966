//! Process-wide handles shared by editing tools.
//!
//! The host owns one `Registry` and lends it to each controller. A controller
//! registers its highlight draw handler when it opens and removes it in
//! `close`, and posts user-facing notifications here.

use std::collections::BTreeMap;

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Registration of a draw handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawHandle(u64);

#[derive(Debug, Default)]
pub struct Registry {
    notifications: Vec<Notification>,
    draw_handlers: BTreeMap<DrawHandle, String>,
    next_handle: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_draw(&mut self, owner: &str) -> DrawHandle {
        self.next_handle += 1;
        let handle = DrawHandle(self.next_handle);
        self.draw_handlers.insert(handle, owner.to_string());
        handle
    }

    /// Returns false if the handle was not registered
    pub fn unregister_draw(&mut self, handle: DrawHandle) -> bool {
        self.draw_handlers.remove(&handle).is_some()
    }

    pub fn is_registered(&self, handle: DrawHandle) -> bool {
        self.draw_handlers.contains_key(&handle)
    }

    pub fn active_draw_handlers(&self) -> usize {
        self.draw_handlers.len()
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_handles_are_unique() {
        let mut reg = Registry::new();
        let a = reg.register_draw("tool");
        let b = reg.register_draw("tool");
        assert_ne!(a, b);
        assert_eq!(reg.active_draw_handlers(), 2);
        assert!(reg.unregister_draw(a));
        assert!(!reg.unregister_draw(a));
        assert!(!reg.is_registered(a));
        assert!(reg.is_registered(b));
    }

    #[test]
    fn test_notifications_drain() {
        let mut reg = Registry::new();
        reg.notify(NotificationLevel::Warning, "nothing to edit");
        assert_eq!(reg.notifications().len(), 1);
        let drained = reg.drain_notifications();
        assert_eq!(drained[0].level, NotificationLevel::Warning);
        assert!(reg.notifications().is_empty());
    }
}
