//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events are immutable facts, named in past tense. An aggregate's
/// event type is a closed enum, so the `apply` match is exhaustive at
/// compile time; an event type the enum does not know fails
/// deserialization during replay instead of being silently skipped.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name used for storage and filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate is a consistency boundary whose state is always a pure fold
/// of `apply` over its ordered event history:
/// - command methods validate and return new events, never mutating state
/// - `apply` is the only state mutator, pure and deterministic
/// - the repository replays stored events through `apply` + `set_version`
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name used for event store organization.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, never-persisted aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    ///
    /// Version starts at 0 and advances with each persisted event.
    fn version(&self) -> Version;

    /// Sets the aggregate version. Called by the repository during replay.
    fn set_version(&mut self, version: Version);

    /// Returns true when a deletion event has been applied.
    ///
    /// Aggregates are never destroyed; logical deletion is itself an event
    /// that flips this flag, and the repository filters deleted aggregates
    /// out of `load_existing`.
    fn is_deleted(&self) -> bool {
        false
    }

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic: the same state and event always
    /// produce the same new state, with no side effects and no failure
    /// (events are facts that already happened).
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for aggregates that support snapshotting.
///
/// A snapshot is a cached fold of the aggregate state at a version, taken
/// every `snapshot_interval` events to shorten replay on load.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the number of events between snapshots.
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}
