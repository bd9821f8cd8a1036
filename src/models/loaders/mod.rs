pub mod roster_loader;

pub use roster_loader::{load_roster, RosterColumns, DEFAULT_PAGE_COUNT_COLUMN};
