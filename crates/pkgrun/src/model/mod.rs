pub mod event;
pub mod family;
pub mod ids;

pub use event::{clamp_fraction, ExitReport, ProgressUpdate, RunnerEvent};
pub use family::{CommandFamilies, CommandFamily, UnknownFamily};
pub use ids::SessionId;
