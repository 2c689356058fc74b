pub mod phase;
pub mod session;
pub mod stimulus;
pub mod view;

pub use phase::{Phase, TaskPhase};
pub use session::{Presentation, SessionSummary};
pub use stimulus::{EmptyStimulusSet, RecencyBuffer, StimulusSet};
pub use view::TaskView;
