//! Poll storage and persistence.
//!
//! The store owns every poll. Callers address polls by id and receive
//! clones; mutation only happens inside [`PollStore::update`], which holds
//! exclusive access to that one poll for the duration of the closure.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::voting::types::{Poll, VoteError, VoteResult};

/// Storage abstraction for polls.
pub trait PollStore: Send + Sync {
    /// Allocate the next poll id.
    fn next_poll_id(&self) -> u64;

    /// Allocate the next option id. Option ids are unique across polls.
    fn next_option_id(&self) -> u64;

    /// Insert a freshly created poll.
    fn insert(&self, poll: Poll) -> VoteResult<()>;

    /// Fetch a copy of a poll.
    fn get(&self, id: u64) -> Option<Poll>;

    /// All polls in creation (id) order.
    fn list(&self) -> Vec<Poll>;

    /// Run `apply` against the stored poll with exclusive access and return
    /// the updated copy. When `apply` fails the stored poll must be left as
    /// it was.
    fn update(
        &self,
        id: u64,
        apply: &mut dyn FnMut(&mut Poll) -> VoteResult<()>,
    ) -> VoteResult<Poll>;

    /// Make the current state durable, if the store supports it.
    fn flush(&self) -> VoteResult<()> {
        Ok(())
    }
}

/// A thread-safe in-memory poll store with optional JSON file persistence.
#[derive(Clone, Default)]
pub struct InMemoryPollStore {
    polls: Arc<DashMap<u64, Poll>>,
    poll_seq: Arc<AtomicU64>,
    option_seq: Arc<AtomicU64>,
    persistence_path: Option<PathBuf>,
    save_lock: Arc<Mutex<()>>,
}

impl InMemoryPollStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from file if it exists, otherwise start empty with that path.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let polls: Vec<Poll> = serde_json::from_reader(reader)?;

            let mut max_poll = 0;
            let mut max_option = 0;
            for poll in polls {
                max_poll = max_poll.max(poll.id);
                for option in &poll.options {
                    max_option = max_option.max(option.id);
                }
                store.polls.insert(poll.id, poll);
            }
            store.poll_seq.store(max_poll, Ordering::SeqCst);
            store.option_seq.store(max_option, Ordering::SeqCst);

            tracing::info!(
                path = %path.display(),
                polls = store.polls.len(),
                "Loaded polls from store file"
            );
        }
        Ok(store)
    }

    /// Save to file. The snapshot is written to a sibling `.tmp` file and
    /// renamed over the store file, so readers never see a partial write.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let _guard = self
                .save_lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let polls = self.list();
            let staging = staging_path(path);

            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer_pretty(&mut writer, &polls)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            drop(writer);
            fs::rename(&staging, path)?;

            tracing::debug!(path = %path.display(), polls = polls.len(), "Saved polls to store file");
        }
        Ok(())
    }

    /// Number of stored polls.
    pub fn len(&self) -> usize {
        self.polls.len()
    }

    /// Whether the store holds no polls.
    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("polls.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

impl PollStore for InMemoryPollStore {
    fn next_poll_id(&self) -> u64 {
        self.poll_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_option_id(&self) -> u64 {
        self.option_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn insert(&self, poll: Poll) -> VoteResult<()> {
        if self.polls.contains_key(&poll.id) {
            return Err(VoteError::Storage(format!("poll {} already exists", poll.id)));
        }
        self.polls.insert(poll.id, poll);
        Ok(())
    }

    fn get(&self, id: u64) -> Option<Poll> {
        self.polls.get(&id).map(|r| r.value().clone())
    }

    fn list(&self) -> Vec<Poll> {
        let mut polls: Vec<Poll> = self.polls.iter().map(|r| r.value().clone()).collect();
        polls.sort_by_key(|p| p.id);
        polls
    }

    fn update(
        &self,
        id: u64,
        apply: &mut dyn FnMut(&mut Poll) -> VoteResult<()>,
    ) -> VoteResult<Poll> {
        let mut entry = self.polls.get_mut(&id).ok_or(VoteError::PollNotFound(id))?;
        let mut working = entry.value().clone();
        apply(&mut working)?;
        *entry.value_mut() = working.clone();
        Ok(working)
    }

    fn flush(&self) -> VoteResult<()> {
        self.save_to_file()
            .map_err(|e| VoteError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::types::PollOption;
    use chrono::Utc;

    fn sample_poll(store: &InMemoryPollStore) -> Poll {
        Poll {
            id: store.next_poll_id(),
            question: "Tabs or spaces?".into(),
            description: None,
            options: vec![
                PollOption {
                    id: store.next_option_id(),
                    option_text: "Tabs".into(),
                    vote_count: 0,
                },
                PollOption {
                    id: store.next_option_id(),
                    option_text: "Spaces".into(),
                    vote_count: 0,
                },
            ],
            created_at: Utc::now(),
            active: true,
        }
    }

    #[test]
    fn sequences_start_at_one() {
        let store = InMemoryPollStore::new(None);
        assert_eq!(store.next_poll_id(), 1);
        assert_eq!(store.next_poll_id(), 2);
        assert_eq!(store.next_option_id(), 1);
    }

    #[test]
    fn failed_update_leaves_poll_untouched() {
        let store = InMemoryPollStore::new(None);
        let poll = sample_poll(&store);
        let id = poll.id;
        store.insert(poll.clone()).unwrap();

        let result = store.update(id, &mut |p| {
            p.options[0].vote_count += 5;
            Err(VoteError::Validation("nope".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.get(id).unwrap(), poll);
    }

    #[test]
    fn update_unknown_poll_is_not_found() {
        let store = InMemoryPollStore::new(None);
        let result = store.update(42, &mut |_| Ok(()));
        assert_eq!(result.unwrap_err(), VoteError::PollNotFound(42));
    }

    #[test]
    fn persistence_round_trip_restores_sequences() {
        let path = std::env::temp_dir().join(format!("iac-polls-{}.json", uuid::Uuid::new_v4()));

        let store = InMemoryPollStore::new(Some(path.clone()));
        let poll = sample_poll(&store);
        store.insert(poll).unwrap();
        store.save_to_file().unwrap();

        let loaded = InMemoryPollStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(1).unwrap().options.len(), 2);
        assert_eq!(loaded.next_poll_id(), 2);
        assert_eq!(loaded.next_option_id(), 3);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn save_replaces_file_and_leaves_no_staging_file() {
        let path = std::env::temp_dir().join(format!("iac-polls-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[]").unwrap();

        let store = InMemoryPollStore::new(Some(path.clone()));
        store.insert(sample_poll(&store)).unwrap();
        store.save_to_file().unwrap();

        assert!(!staging_path(&path).exists());
        assert_eq!(InMemoryPollStore::load_from_file(&path).unwrap().len(), 1);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn interrupted_save_keeps_previous_file_intact() {
        let path = std::env::temp_dir().join(format!("iac-polls-{}.json", uuid::Uuid::new_v4()));
        let store = InMemoryPollStore::new(Some(path.clone()));
        store.insert(sample_poll(&store)).unwrap();
        store.save_to_file().unwrap();

        // A crash mid-write only ever truncates the staging file.
        std::fs::write(staging_path(&path), "[{\"id\": 1, \"quest").unwrap();
        let loaded = InMemoryPollStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);

        store.save_to_file().unwrap();
        assert!(!staging_path(&path).exists());

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn staging_file_sits_beside_store_file() {
        let staging = staging_path(Path::new("/var/lib/iac/polls.json"));
        assert_eq!(staging, Path::new("/var/lib/iac/polls.json.tmp"));
    }
}
