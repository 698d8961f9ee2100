//! `rail_core` — conflict prediction over a single-line railway section.
//!
//! No IO, no network. All randomness via seeds passed in by the caller.

pub mod conflict;
mod engine;
pub mod error;
mod id;
pub mod metrics;
pub mod ranking;
pub mod sandbox;
pub mod signal;
mod topology;
mod types;
pub mod validate;
pub mod view;

pub use conflict::{classify, detect_conflicts};
pub use engine::tick;
pub use error::{MalformedTrainError, ScenarioError, TopologyError};
pub use id::generate_uuid;
pub use metrics::{compute_overview, platform_summary, NetworkOverview, PlatformSummary};
pub use ranking::{most_urgent, rank};
pub use sandbox::{run_scenario, Scenario, ScenarioAction, SimulationResult};
pub use signal::{resolve_signals, StationSignal};
pub use topology::{Interpolation, TrackTopology};
pub use types::*;
pub use view::{derive, NetworkView};

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;
