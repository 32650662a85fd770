mod state;

pub use state::ElectionStatus;
