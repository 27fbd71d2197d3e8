//! Path tracking engine
//!
//! Pure, synchronous geometry evaluated once per pointer sample:
//! - Path specifications sampled into polylines with cumulative arc length
//! - Nearest-segment proximity queries
//! - Monotonic, wrap-aware progress with on/off-track classification

pub mod path;
pub mod progress;
pub mod proximity;

pub use path::{PathError, PathModel, PathSpec};
pub use progress::{ProgressAccumulator, TrackState, TrackStep};
pub use proximity::{Proximity, closest_on_segment, evaluate};
