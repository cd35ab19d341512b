//! In-memory list of uploaded files shown on the index page.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::DOWNLOAD_ROUTE;

/// One tracked upload. The download URL is always derived from the name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    name: String,
    url: String,
}

impl FileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let url = download_url(&name);
        Self { name, url }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub fn download_url(name: &str) -> String {
    format!("{DOWNLOAD_ROUTE}?file={}", urlencoding::encode(name))
}

/// Ordered collection of uploads. Every operation is atomic with respect to
/// the others.
pub trait Registry: Send + Sync {
    fn list(&self) -> Vec<FileRecord>;

    fn add(&self, record: FileRecord);

    /// Drops the first record named `name`; returns whether one was found.
    fn remove(&self, name: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    records: Mutex<Vec<FileRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never leave the vector half-updated, so a poisoned
    // lock is still safe to use.
    fn records(&self) -> MutexGuard<'_, Vec<FileRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry for MemoryRegistry {
    fn list(&self) -> Vec<FileRecord> {
        self.records().clone()
    }

    fn add(&self, record: FileRecord) {
        self.records().push(record);
    }

    fn remove(&self, name: &str) -> bool {
        let mut records = self.records();
        match records.iter().position(|record| record.name == name) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn names(registry: &MemoryRegistry) -> Vec<String> {
        registry
            .list()
            .into_iter()
            .map(|record| record.name().to_string())
            .collect()
    }

    #[test]
    fn url_is_derived_from_name() {
        let record = FileRecord::new("report.txt");
        assert_eq!(record.url(), "/download?file=report.txt");

        let record = FileRecord::new("a&b #1.txt");
        assert_eq!(record.url(), "/download?file=a%26b%20%231.txt");
    }

    #[test]
    fn remove_drops_only_first_match() {
        let registry = MemoryRegistry::new();
        registry.add(FileRecord::new("a"));
        registry.add(FileRecord::new("b"));
        registry.add(FileRecord::new("a"));

        assert!(registry.remove("a"));
        assert_eq!(names(&registry), ["b", "a"]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let registry = MemoryRegistry::new();
        registry.add(FileRecord::new("a"));

        assert!(!registry.remove("zzz"));
        assert_eq!(names(&registry), ["a"]);
    }

    #[test]
    fn survivors_keep_insertion_order() {
        let registry = MemoryRegistry::new();
        for name in ["one", "two", "three", "four"] {
            registry.add(FileRecord::new(name));
        }
        registry.remove("two");
        registry.remove("four");
        registry.remove("four");
        registry.add(FileRecord::new("five"));

        assert_eq!(names(&registry), ["one", "three", "five"]);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let registry = Arc::new(MemoryRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        registry.add(FileRecord::new(format!("{worker}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(registry.list().len(), 400);
    }
}
