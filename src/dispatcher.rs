//! Access event dispatcher: RFID polling, presence edge detection, and the
//! occupancy/door reaction to a detected tag.
//!
//! Each physical reader is a [`ReaderChannel`] with a role (entry or exit)
//! and a [`Presence`] state machine. A tag held in the field produces exactly
//! one [`AccessEvent`]; the channel re-arms once a poll sees an empty field.
//!
//! Polling and applying are separate steps so the caller can poll readers
//! without holding any lock and apply the events under one:
//!
//! ```rust
//! use barn_gate::config::DoorConfig;
//! use barn_gate::dispatcher::{apply_access_event, AccessDispatcher};
//! use barn_gate::door::{DoorController, DoorState};
//! use barn_gate::hal::{MockStepper, MockTagReader};
//! use barn_gate::occupancy::BarnOccupancy;
//! use barn_gate::registry::{TagRegistry, HERD};
//!
//! let mut dispatcher =
//!     AccessDispatcher::new(TagRegistry::herd(), MockTagReader::new(), MockTagReader::new());
//! let mut barn = BarnOccupancy::new();
//! let mut door = DoorController::new(MockStepper::new(), DoorConfig::default()).unwrap();
//!
//! dispatcher.entry_mut().reader_mut().set_present(HERD[0].id);
//!
//! let mut events = Vec::new();
//! dispatcher.poll(|event| events.push(*event)).unwrap();
//! for event in &events {
//!     apply_access_event(event, &mut barn, &mut door, 0).unwrap();
//! }
//!
//! assert!(barn.contains("Bron"));
//! assert_eq!(door.state(), DoorState::Opening);
//! ```

use core::fmt;

use tracing::{debug, info};

use crate::door::{DoorController, DoorOutcome};
use crate::occupancy::{OccupancyChange, OccupancySet};
use crate::registry::TagRegistry;
use crate::traits::{StepperDriver, TagId, TagReader};

/// Which side of the gate a reader watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelRole {
    /// Outside reader; a detection means the animal is coming in.
    Entry,
    /// Inside reader; a detection means the animal is going out.
    Exit,
}

impl ChannelRole {
    /// Lower-case label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChannelRole::Entry => "entry",
            ChannelRole::Exit => "exit",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a tag is in a reader's field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Presence {
    /// No tag seen on the last poll.
    #[default]
    Absent,
    /// A tag was seen and has not left yet.
    Present,
}

/// Transition of a [`Presence`] state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceEdge {
    /// A tag entered the field.
    Arrived,
    /// The field became empty.
    Departed,
}

impl Presence {
    /// Feed one poll result; returns the edge, if any.
    pub fn observe(&mut self, detected: bool) -> Option<PresenceEdge> {
        match (*self, detected) {
            (Presence::Absent, true) => {
                *self = Presence::Present;
                Some(PresenceEdge::Arrived)
            }
            (Presence::Present, false) => {
                *self = Presence::Absent;
                Some(PresenceEdge::Departed)
            }
            _ => None,
        }
    }
}

/// A tag arriving at a reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessEvent {
    /// Reader role.
    pub role: ChannelRole,
    /// Identifier read.
    pub id: TagId,
    /// Resolved display name (`"UNKNOWN"` when unregistered).
    pub name: &'static str,
}

/// One physical reader with its presence tracking.
#[derive(Debug)]
pub struct ReaderChannel<R> {
    role: ChannelRole,
    reader: R,
    presence: Presence,
}

impl<R: TagReader> ReaderChannel<R> {
    /// Wrap a reader. Presence starts `Absent`.
    pub fn new(role: ChannelRole, reader: R) -> Self {
        Self {
            role,
            reader,
            presence: Presence::Absent,
        }
    }

    /// Reader role.
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    /// Current presence state.
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Borrow the reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Mutably borrow the reader.
    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Query the reader once; returns an event on the arrival edge.
    fn poll(&mut self, registry: &TagRegistry) -> Result<Option<AccessEvent>, R::Error> {
        let tag = self.reader.read_tag()?;
        match self.presence.observe(tag.is_some()) {
            Some(PresenceEdge::Arrived) => {
                let Some(id) = tag else {
                    return Ok(None);
                };
                let name = registry.resolve(&id);
                info!(role = self.role.as_str(), %id, name, "tag detected");
                Ok(Some(AccessEvent {
                    role: self.role,
                    id,
                    name,
                }))
            }
            Some(PresenceEdge::Departed) => {
                debug!(role = self.role.as_str(), "field clear");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Polls the entry and exit readers and turns arrivals into events.
pub struct AccessDispatcher<R: TagReader> {
    registry: TagRegistry,
    entry: ReaderChannel<R>,
    exit: ReaderChannel<R>,
}

impl<R: TagReader> AccessDispatcher<R> {
    /// Create a dispatcher over an entry reader and an exit reader.
    pub fn new(registry: TagRegistry, entry: R, exit: R) -> Self {
        Self {
            registry,
            entry: ReaderChannel::new(ChannelRole::Entry, entry),
            exit: ReaderChannel::new(ChannelRole::Exit, exit),
        }
    }

    /// Poll both readers, entry first.
    ///
    /// Each arrival is handed to `on_event`, then acknowledged on its reader.
    /// Returns the number of events produced.
    pub fn poll<F>(&mut self, mut on_event: F) -> Result<usize, R::Error>
    where
        F: FnMut(&AccessEvent),
    {
        let mut count = 0;
        for channel in [&mut self.entry, &mut self.exit] {
            if let Some(event) = channel.poll(&self.registry)? {
                on_event(&event);
                channel.reader.acknowledge()?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// The registry used to resolve names.
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Entry channel.
    pub fn entry(&self) -> &ReaderChannel<R> {
        &self.entry
    }

    /// Mutable entry channel.
    pub fn entry_mut(&mut self) -> &mut ReaderChannel<R> {
        &mut self.entry
    }

    /// Exit channel.
    pub fn exit(&self) -> &ReaderChannel<R> {
        &self.exit
    }

    /// Mutable exit channel.
    pub fn exit_mut(&mut self) -> &mut ReaderChannel<R> {
        &mut self.exit
    }
}

/// What applying one event changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventReport {
    /// Occupancy mutation (or logged no-op).
    pub occupancy: OccupancyChange,
    /// Door command outcome, or `None` if no open was attempted.
    pub door: Option<DoorOutcome>,
}

/// Apply an access event: update occupancy, then open the door if it is
/// idle and not held open manually.
pub fn apply_access_event<S, const N: usize>(
    event: &AccessEvent,
    occupancy: &mut OccupancySet<N>,
    door: &mut DoorController<S>,
    now_ms: u64,
) -> Result<EventReport, S::Error>
where
    S: StepperDriver,
{
    let occupancy_change = match event.role {
        ChannelRole::Entry => occupancy.add_if_absent(event.name),
        ChannelRole::Exit => occupancy.remove_if_present(event.name),
    };

    let door_outcome = if door.is_idle() && !door.is_manual_hold() {
        Some(door.request_open(false, now_ms)?)
    } else {
        info!(
            name = event.name,
            door = door.status_label(),
            manual = door.is_manual_hold(),
            "door busy, event not opening"
        );
        None
    };

    Ok(EventReport {
        occupancy: occupancy_change,
        door: door_outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    use crate::hal::MockTagReader;
    use crate::registry::{HERD, UNKNOWN_NAME};

    #[test]
    fn presence_edges() {
        let mut presence = Presence::default();
        assert_eq!(presence.observe(false), None);
        assert_eq!(presence.observe(true), Some(PresenceEdge::Arrived));
        assert_eq!(presence.observe(true), None);
        assert_eq!(presence.observe(true), None);
        assert_eq!(presence.observe(false), Some(PresenceEdge::Departed));
        assert_eq!(presence, Presence::Absent);
    }

    #[test]
    fn held_tag_fires_once() {
        let mut channel = ReaderChannel::new(ChannelRole::Entry, MockTagReader::new());
        let registry = TagRegistry::herd();
        channel.reader_mut().set_present(HERD[1].id);

        let first = channel.poll(&registry).unwrap();
        assert_eq!(first.map(|e| e.name), Some("TFrance"));
        for _ in 0..5 {
            assert_eq!(channel.poll(&registry).unwrap(), None);
        }
        assert_eq!(channel.presence(), Presence::Present);
    }

    #[test]
    fn unknown_tag_still_produces_event() {
        let mut channel = ReaderChannel::new(ChannelRole::Exit, MockTagReader::new());
        channel.reader_mut().set_present(TagId::new([0, 1, 2, 3]));
        let event = channel.poll(&TagRegistry::herd()).unwrap().unwrap();
        assert_eq!(event.name, UNKNOWN_NAME);
        assert_eq!(event.role, ChannelRole::Exit);
    }

    #[test]
    fn poll_acknowledges_after_event() {
        let mut dispatcher = AccessDispatcher::new(
            TagRegistry::herd(),
            MockTagReader::new(),
            MockTagReader::new(),
        );
        dispatcher.exit_mut().reader_mut().set_present(HERD[0].id);

        let mut seen = 0;
        let count = dispatcher.poll(|_| seen += 1).unwrap();
        assert_eq!(count, 1);
        assert_eq!(seen, 1);
        assert_eq!(dispatcher.exit().reader().acks, 1);
        assert_eq!(dispatcher.entry().reader().acks, 0);
        assert_eq!(dispatcher.entry().reader().reads, 1);
    }

    #[test]
    fn reader_error_propagates() {
        let mut dispatcher = AccessDispatcher::new(
            TagRegistry::herd(),
            MockTagReader::new(),
            MockTagReader::new(),
        );
        dispatcher.entry_mut().reader_mut().fail_reads = true;
        assert_eq!(dispatcher.poll(|_| {}), Err(()));
    }

    #[test]
    fn role_labels() {
        assert_eq!(ChannelRole::Entry.as_str(), "entry");
        assert_eq!(ChannelRole::Exit.to_string(), "exit");
    }
}
