use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Info,    // Cyan
    Success, // Green
    Warning, // Yellow
    Error,   // Red
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub toast_type: ToastType,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(id: u64, message: impl Into<String>, toast_type: ToastType) -> Self {
        // Errors stay up long enough to read
        let duration = match toast_type {
            ToastType::Error => Duration::from_secs(5),
            _ => Duration::from_secs(3),
        };
        Self {
            id,
            message: message.into(),
            toast_type,
            created_at: Instant::now(),
            duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// Short-lived operator notifications (validation errors, refresh feedback).
pub struct ToastManager {
    queue: VecDeque<Toast>,
    next_id: u64,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            next_id: 1,
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, toast_type: ToastType) {
        let toast = Toast::new(self.next_id, message, toast_type);
        self.next_id = self.next_id.wrapping_add(1);
        self.queue.push_back(toast);
        while self.queue.len() > self.max_visible {
            self.queue.pop_front();
        }
    }

    pub fn update(&mut self) {
        self.queue.retain(|t| !t.is_expired());
    }

    pub fn visible_toasts(&self) -> Vec<&Toast> {
        self.queue.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_capped() {
        let mut toasts = ToastManager::new();
        for i in 0..10 {
            toasts.push(format!("toast {i}"), ToastType::Info);
        }
        let visible = toasts.visible_toasts();
        assert_eq!(visible.len(), 4);
        assert_eq!(visible[3].message, "toast 9");
    }

    #[test]
    fn test_error_toasts_last_longer() {
        let info = Toast::new(1, "a", ToastType::Info);
        let error = Toast::new(2, "b", ToastType::Error);
        assert!(error.duration > info.duration);
        assert!(!error.is_expired());
    }
}
