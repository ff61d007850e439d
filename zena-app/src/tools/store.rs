use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPORT_QUOTA: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub duration_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub done: bool,
}

/// Shared backing store for the built-in capabilities.
pub struct DemoStore {
    contacts: Mutex<Vec<Contact>>,
    events: Mutex<Vec<CalendarEvent>>,
    tasks: Mutex<Vec<TaskItem>>,
    export_quota: Mutex<u32>,
}

impl Default for DemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoStore {
    pub fn new() -> Self {
        Self {
            contacts: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            export_quota: Mutex::new(DEFAULT_EXPORT_QUOTA),
        }
    }

    pub fn with_export_quota(self, quota: u32) -> Self {
        *self.export_quota.lock() = quota;
        self
    }

    /// A store with a few tasks so searches have something to find.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (title, done) in [
            ("Prepare quarterly report", false),
            ("Call the dentist", true),
            ("Review contract draft", false),
        ] {
            store.add_task(title, done);
        }
        store
    }

    pub fn add_contact(&self, name: &str, email: Option<&str>) -> Contact {
        let contact = Contact {
            id: new_id("contact"),
            name: name.to_string(),
            email: email.map(str::to_string),
        };
        self.contacts.lock().push(contact.clone());
        contact
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.lock().clone()
    }

    /// Case-insensitive substring match on name and email.
    pub fn search_contacts(&self, query: &str) -> Vec<Contact> {
        let query = query.to_lowercase();
        self.contacts
            .lock()
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query)
                    || c.email
                        .as_deref()
                        .map(|e| e.to_lowercase().contains(&query))
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn add_event(&self, title: &str, start: &str, duration_minutes: u64) -> CalendarEvent {
        let event = CalendarEvent {
            id: new_id("event"),
            title: title.to_string(),
            start: start.to_string(),
            duration_minutes,
        };
        self.events.lock().push(event.clone());
        event
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().clone()
    }

    pub fn add_task(&self, title: &str, done: bool) -> TaskItem {
        let task = TaskItem {
            id: new_id("task"),
            title: title.to_string(),
            done,
        };
        self.tasks.lock().push(task.clone());
        task
    }

    pub fn search_tasks(&self, query: &str, done: Option<bool>) -> Vec<TaskItem> {
        let query = query.to_lowercase();
        self.tasks
            .lock()
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&query))
            .filter(|t| done.map(|d| t.done == d).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Spend one unit of export quota. Returns false once it is used up.
    pub fn take_export_quota(&self) -> bool {
        let mut quota = self.export_quota.lock();
        if *quota == 0 {
            return false;
        }
        *quota -= 1;
        true
    }

    pub fn export_quota(&self) -> u32 {
        *self.export_quota.lock()
    }
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
