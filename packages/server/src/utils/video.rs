use serde_json::Value;

use crate::models::shared::{json_string_list, to_json_list};

/// The two video columns of an audition: the current upload and everything it superseded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSlots {
    pub current: Vec<String>,
    pub backups: Vec<String>,
}

impl VideoSlots {
    pub fn from_json(current: &Value, backups: &Value) -> Self {
        Self {
            current: json_string_list(current),
            backups: json_string_list(backups),
        }
    }

    /// Move every current URL to the backups and make `new_url` the only current video.
    pub fn replace(&mut self, new_url: String) {
        self.backups.append(&mut self.current);
        self.current.push(new_url);
    }

    /// Move `url` from current to backups. Returns `false` if it is not a current video.
    pub fn remove(&mut self, url: &str) -> bool {
        let Some(pos) = self.current.iter().position(|u| u == url) else {
            return false;
        };
        let removed = self.current.remove(pos);
        self.backups.push(removed);
        true
    }

    pub fn to_json(&self) -> (Value, Value) {
        (to_json_list(&self.current), to_json_list(&self.backups))
    }
}
