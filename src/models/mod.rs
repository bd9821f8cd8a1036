pub mod identity;
pub mod loaders;
pub mod page;
pub mod recognition;
pub mod roster;

pub use identity::{IdentityCandidate, MatchCandidate, MatchOutcome};
pub use loaders::{load_roster, RosterColumns};
pub use page::{PageRef, StudentDocument};
pub use recognition::RecognitionResult;
pub use roster::{Roster, RosterEntry};
