use parking_lot::Mutex;
use rail_control::TelemetrySource;
use rail_core::{Constants, NetworkView, WorldState};
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct LiveState {
    pub world: WorldState,
    pub constants: Constants,
    pub feed: Box<dyn TelemetrySource + Send>,
    /// View derived after the most recent tick.
    pub latest_view: NetworkView,
}

impl LiveState {
    pub fn new(world: WorldState, constants: Constants, feed: Box<dyn TelemetrySource + Send>) -> Self {
        let latest_view = rail_core::derive(&world, &constants);
        Self {
            world,
            constants,
            feed,
            latest_view,
        }
    }
}

pub type SharedWorld = Arc<Mutex<LiveState>>;
pub type ViewTx = broadcast::Sender<NetworkView>;

pub fn shared(state: LiveState) -> SharedWorld {
    Arc::new(Mutex::new(state))
}

/// Clone of the live world for readers; the lock is held only for the copy.
pub fn snapshot(sim: &SharedWorld) -> (WorldState, Constants) {
    let guard = sim.lock();
    (guard.world.clone(), guard.constants.clone())
}
