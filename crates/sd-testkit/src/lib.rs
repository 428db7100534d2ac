//! Shared fixtures for scenario tests: entity builders and a deterministic
//! recording notifier (the in-process stand-in for real delivery channels).

use std::sync::Mutex;

use uuid::Uuid;

use sd_db::NewUser;
use sd_notify::{Notice, Notifier};
use sd_schemas::{NewOrder, Role};

/// A dispatcher ready for insertion.
pub fn dispatcher(username: &str) -> NewUser {
    NewUser {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        full_name: String::new(),
        role: Role::Dispatcher,
        active: true,
    }
}

/// A master ready for insertion.
pub fn master(username: &str) -> NewUser {
    NewUser {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        full_name: String::new(),
        role: Role::Master,
        active: true,
    }
}

/// A plausible public submission.
pub fn sample_order() -> NewOrder {
    NewOrder {
        category: "plumbing".to_string(),
        description: "leaking tap in the kitchen".to_string(),
        address: "12 River St".to_string(),
        customer_name: "Ivan".to_string(),
        customer_contact: "+79990000000".to_string(),
    }
}

/// Captures every notice instead of delivering it, so tests can assert on
/// exactly what a transition dispatched.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    /// Drain the recording (handy between scenario phases).
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut self.notices.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
