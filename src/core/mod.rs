pub mod campaign;
pub mod resolution;
pub mod time;
pub mod utils;

pub use campaign::{CampaignCalendar, CampaignWindows, DateWindow, WindowKind};
pub use resolution::{DayOverview, ResetSummary, ResolutionEngine};
pub use time::{Clock, FixedClock, SystemClock};
