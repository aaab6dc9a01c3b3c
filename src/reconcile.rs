use crate::models::{Folder, Page};
use chrono::{DateTime, Utc};

pub trait Stored {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Stored for Folder {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Stored for Page {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub fn split_oldest<T: Stored>(mut records: Vec<T>) -> Option<(T, Vec<T>)> {
    if records.is_empty() {
        return None;
    }
    records.sort_by_key(|record| record.created_at());
    let primary = records.remove(0);
    Some((primary, records))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub reparented: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
