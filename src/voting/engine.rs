//! Vote tallying: poll creation, vote casting and deactivation.

use std::sync::Arc;

use chrono::Utc;

use crate::observability::metrics;
use crate::voting::store::PollStore;
use crate::voting::types::{
    CreatePollRequest, Poll, PollOption, PollView, VoteError, VoteResult,
};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
pub const MAX_QUESTION_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_OPTION_CHARS: usize = 100;

/// Service fronting a [`PollStore`].
#[derive(Clone)]
pub struct VoteService {
    store: Arc<dyn PollStore>,
}

impl VoteService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn PollStore>) -> Self {
        Self { store }
    }

    /// Validate and create a poll. All options start at zero votes.
    pub fn create_poll(&self, request: CreatePollRequest) -> VoteResult<PollView> {
        validate_request(&request)?;

        let options = request
            .options
            .iter()
            .map(|text| PollOption {
                id: self.store.next_option_id(),
                option_text: text.trim().to_string(),
                vote_count: 0,
            })
            .collect();

        let poll = Poll {
            id: self.store.next_poll_id(),
            question: request.question.trim().to_string(),
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            options,
            created_at: Utc::now(),
            active: true,
        };
        let view = PollView::from(&poll);

        self.store.insert(poll)?;
        self.persist();

        metrics::record_poll_created();
        tracing::info!(poll_id = view.id, options = view.options.len(), "Poll created");
        Ok(view)
    }

    /// Add exactly one vote to `option_id` of an active poll.
    pub fn cast_vote(&self, poll_id: u64, option_id: u64) -> VoteResult<PollView> {
        let poll = self.store.update(poll_id, &mut |poll| {
            if !poll.active {
                return Err(VoteError::PollInactive(poll_id));
            }
            let option = poll
                .options
                .iter_mut()
                .find(|o| o.id == option_id)
                .ok_or(VoteError::OptionNotFound { poll_id, option_id })?;
            option.vote_count = option.vote_count.saturating_add(1);
            Ok(())
        });

        let poll = match poll {
            Ok(poll) => poll,
            Err(e) => {
                tracing::warn!(poll_id, option_id, error = %e, "Vote rejected");
                return Err(e);
            }
        };
        self.persist();

        metrics::record_vote_cast();
        tracing::info!(
            poll_id,
            option_id,
            total_votes = poll.total_votes(),
            "Vote cast"
        );
        Ok(PollView::from(&poll))
    }

    /// Mark a poll inactive. Deactivating an inactive poll succeeds.
    pub fn deactivate_poll(&self, poll_id: u64) -> VoteResult<PollView> {
        let mut changed = false;
        let poll = self.store.update(poll_id, &mut |poll| {
            changed = poll.active;
            poll.active = false;
            Ok(())
        })?;

        if changed {
            self.persist();
            tracing::info!(poll_id, "Poll deactivated");
        }
        Ok(PollView::from(&poll))
    }

    /// A single poll, if it exists.
    pub fn get_poll(&self, poll_id: u64) -> Option<PollView> {
        self.store.get(poll_id).as_ref().map(PollView::from)
    }

    /// Every poll, active or not, in creation order.
    pub fn list_polls(&self) -> Vec<PollView> {
        self.store.list().iter().map(PollView::from).collect()
    }

    /// Active polls, newest first.
    pub fn list_active_polls(&self) -> Vec<PollView> {
        let mut polls: Vec<Poll> = self.store.list().into_iter().filter(|p| p.active).collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        polls.iter().map(PollView::from).collect()
    }

    /// Create sample polls when the store is empty.
    pub fn seed_demo_polls(&self) -> VoteResult<()> {
        if !self.store.list().is_empty() {
            return Ok(());
        }
        let samples = [
            (
                "Which AWS service do you use the most?",
                Some("Infrastructure demo poll"),
                vec!["EC2", "S3", "RDS", "CloudFront"],
            ),
            (
                "Preferred IaC tool?",
                None,
                vec!["Terraform", "CloudFormation", "CDK", "Pulumi"],
            ),
        ];
        for (question, description, options) in samples {
            self.create_poll(CreatePollRequest {
                question: question.to_string(),
                description: description.map(str::to_string),
                options: options.into_iter().map(str::to_string).collect(),
            })?;
        }
        Ok(())
    }

    /// Flush the store, reporting failures to the caller.
    pub fn flush(&self) -> VoteResult<()> {
        self.store.flush()
    }

    /// Save after a mutation. Inside a runtime the write goes to the
    /// blocking pool so request workers never wait on disk.
    fn persist(&self) {
        let store = self.store.clone();
        let save = move || {
            if let Err(e) = store.flush() {
                tracing::error!(error = %e, "Failed to persist poll store");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(save);
            }
            Err(_) => save(),
        }
    }
}

fn validate_request(request: &CreatePollRequest) -> VoteResult<()> {
    if request.question.trim().is_empty() {
        return Err(VoteError::Validation("question is required".into()));
    }
    if request.question.chars().count() > MAX_QUESTION_CHARS {
        return Err(VoteError::Validation(format!(
            "question must be at most {MAX_QUESTION_CHARS} characters"
        )));
    }
    if let Some(description) = &request.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(VoteError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }
    if request.options.len() < MIN_OPTIONS || request.options.len() > MAX_OPTIONS {
        return Err(VoteError::Validation(format!(
            "a poll needs between {MIN_OPTIONS} and {MAX_OPTIONS} options, got {}",
            request.options.len()
        )));
    }
    for (index, text) in request.options.iter().enumerate() {
        if text.trim().is_empty() {
            return Err(VoteError::Validation(format!("option {} is blank", index + 1)));
        }
        if text.chars().count() > MAX_OPTION_CHARS {
            return Err(VoteError::Validation(format!(
                "option {} must be at most {MAX_OPTION_CHARS} characters",
                index + 1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::store::InMemoryPollStore;

    fn service() -> VoteService {
        VoteService::new(Arc::new(InMemoryPollStore::new(None)))
    }

    fn request(question: &str, options: &[&str]) -> CreatePollRequest {
        CreatePollRequest {
            question: question.to_string(),
            description: None,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn counts(view: &PollView) -> Vec<u32> {
        view.options.iter().map(|o| o.vote_count).collect()
    }

    fn percentages(view: &PollView) -> Vec<f64> {
        view.options.iter().map(|o| o.percentage).collect()
    }

    #[test]
    fn pick_one_scenario() {
        let svc = service();
        let poll = svc.create_poll(request("Pick one", &["A", "B"])).unwrap();
        assert_eq!(counts(&poll), vec![0, 0]);
        assert_eq!(poll.total_votes, 0);
        assert!(poll.active);

        let a = poll.options[0].id;
        let b = poll.options[1].id;

        let poll = svc.cast_vote(poll.id, a).unwrap();
        assert_eq!(counts(&poll), vec![1, 0]);
        assert_eq!(percentages(&poll), vec![100.0, 0.0]);
        assert_eq!(poll.total_votes, 1);

        let poll = svc.cast_vote(poll.id, b).unwrap();
        assert_eq!(counts(&poll), vec![1, 1]);
        assert_eq!(percentages(&poll), vec![50.0, 50.0]);
    }

    #[test]
    fn option_count_bounds() {
        let svc = service();
        assert!(matches!(
            svc.create_poll(request("q", &["only"])),
            Err(VoteError::Validation(_))
        ));

        let ten: Vec<String> = (1..=10).map(|i| format!("o{i}")).collect();
        let ten_refs: Vec<&str> = ten.iter().map(String::as_str).collect();
        assert!(svc.create_poll(request("q", &ten_refs)).is_ok());

        let eleven: Vec<String> = (1..=11).map(|i| format!("o{i}")).collect();
        let eleven_refs: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert!(matches!(
            svc.create_poll(request("q", &eleven_refs)),
            Err(VoteError::Validation(_))
        ));
    }

    #[test]
    fn question_and_description_limits() {
        let svc = service();
        assert!(svc.create_poll(request("   ", &["a", "b"])).is_err());
        assert!(svc.create_poll(request(&"q".repeat(201), &["a", "b"])).is_err());
        assert!(svc.create_poll(request(&"q".repeat(200), &["a", "b"])).is_ok());

        let mut long_description = request("q", &["a", "b"]);
        long_description.description = Some("d".repeat(501));
        assert!(svc.create_poll(long_description).is_err());
    }

    #[test]
    fn blank_option_rejected() {
        let svc = service();
        assert!(matches!(
            svc.create_poll(request("q", &["a", " "])),
            Err(VoteError::Validation(_))
        ));
    }

    #[test]
    fn vote_only_touches_target_option() {
        let svc = service();
        let poll = svc.create_poll(request("q", &["a", "b", "c"])).unwrap();
        let target = poll.options[1].id;

        svc.cast_vote(poll.id, poll.options[0].id).unwrap();
        let before = svc.get_poll(poll.id).unwrap();
        let after = svc.cast_vote(poll.id, target).unwrap();

        for (b, a) in before.options.iter().zip(after.options.iter()) {
            if a.id == target {
                assert_eq!(a.vote_count, b.vote_count + 1);
            } else {
                assert_eq!(a.vote_count, b.vote_count);
            }
        }
        assert_eq!(
            after.total_votes,
            after.options.iter().map(|o| o.vote_count).sum::<u32>()
        );
    }

    #[test]
    fn invalid_votes_do_not_mutate() {
        let svc = service();
        let poll = svc.create_poll(request("q", &["a", "b"])).unwrap();
        let other = svc.create_poll(request("other", &["x", "y"])).unwrap();

        assert_eq!(svc.cast_vote(99, 1), Err(VoteError::PollNotFound(99)));
        assert_eq!(
            svc.cast_vote(poll.id, other.options[0].id),
            Err(VoteError::OptionNotFound {
                poll_id: poll.id,
                option_id: other.options[0].id
            })
        );

        svc.deactivate_poll(poll.id).unwrap();
        assert_eq!(
            svc.cast_vote(poll.id, poll.options[0].id),
            Err(VoteError::PollInactive(poll.id))
        );

        let unchanged = svc.get_poll(poll.id).unwrap();
        assert_eq!(counts(&unchanged), vec![0, 0]);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let svc = service();
        let poll = svc.create_poll(request("q", &["a", "b"])).unwrap();
        assert!(svc.deactivate_poll(poll.id).is_ok());
        assert!(svc.deactivate_poll(poll.id).is_ok());
        assert!(!svc.get_poll(poll.id).unwrap().active);
        assert_eq!(svc.deactivate_poll(7), Err(VoteError::PollNotFound(7)));
    }

    #[test]
    fn active_polls_newest_first() {
        let svc = service();
        let first = svc.create_poll(request("first", &["a", "b"])).unwrap();
        let second = svc.create_poll(request("second", &["a", "b"])).unwrap();
        let third = svc.create_poll(request("third", &["a", "b"])).unwrap();
        svc.deactivate_poll(second.id).unwrap();

        let ids: Vec<u64> = svc.list_active_polls().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(svc.list_polls().len(), 3);
    }

    #[test]
    fn seeding_only_happens_once() {
        let svc = service();
        svc.seed_demo_polls().unwrap();
        svc.seed_demo_polls().unwrap();
        assert_eq!(svc.list_polls().len(), 2);
    }

    #[test]
    fn concurrent_votes_are_not_lost() {
        let svc = service();
        let poll = svc.create_poll(request("q", &["a", "b"])).unwrap();
        let option = poll.options[0].id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        svc.cast_vote(poll.id, option).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let poll = svc.get_poll(poll.id).unwrap();
        assert_eq!(poll.options[0].vote_count, 400);
        assert_eq!(poll.total_votes, 400);
    }

    #[tokio::test]
    async fn votes_are_saved_in_the_background() {
        let path = std::env::temp_dir().join(format!("iac-polls-{}.json", uuid::Uuid::new_v4()));
        let svc = VoteService::new(Arc::new(InMemoryPollStore::new(Some(path.clone()))));
        let poll = svc.create_poll(request("q", &["a", "b"])).unwrap();
        svc.cast_vote(poll.id, poll.options[1].id).unwrap();

        let mut saved = 0;
        for _ in 0..50 {
            if let Ok(store) = InMemoryPollStore::load_from_file(&path) {
                if let Some(stored) = store.get(poll.id) {
                    saved = stored.options[1].vote_count;
                    if saved == 1 {
                        break;
                    }
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(saved, 1);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
