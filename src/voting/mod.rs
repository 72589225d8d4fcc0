//! Voting subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/votes
//!     → engine.rs (validate request, allocate ids)
//!     → store.rs (insert, persist)
//!
//! POST /api/votes/{poll}/options/{option}
//!     → engine.rs (cast_vote)
//!     → store.rs update: exclusive per-poll access
//!         increment one option count
//!     → types.rs PollView (totals and percentages derived on read)
//! ```
//!
//! # Design Decisions
//! - The store owns all polls; handlers only ever hold ids or copies
//! - Totals and percentages are derived, never persisted
//! - Mutations to one poll are serialized, different polls never contend

pub mod engine;
pub mod store;
pub mod types;

pub use engine::VoteService;
pub use store::{InMemoryPollStore, PollStore};
pub use types::{CreatePollRequest, Poll, PollOption, PollView, VoteError, VoteResult};
