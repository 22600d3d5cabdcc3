pub mod controller;
pub mod focus;
pub mod forest;
pub mod highlight;
pub mod layout;
pub mod progress;
pub mod session;
pub mod visibility;

pub use controller::{RefreshOutcome, RefreshToken, Snapshot, TreeState};
pub use focus::Direction;
pub use forest::{Forest, IntegrityWarning, build_forest};
pub use session::Session;
