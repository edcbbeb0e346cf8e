//! In-memory quest repository.

mod quest;

pub use quest::InMemoryQuestRepository;
