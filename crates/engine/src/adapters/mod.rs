//! Provider adapters bundled with the engine

mod simulated;

pub use simulated::SimulatedProvider;
