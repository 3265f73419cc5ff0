//! Intent names the deriver folds.

pub const CURRENT_VIEW: &str = "state:currentView";
pub const JOURNAL_SET: &str = "journal.set";
pub const JOURNAL_ADD: &str = "journal.add";
pub const STATE_UPDATE: &str = "state.update";
pub const SCAN_RESULT: &str = "scan.result";
pub const SCAN_INTERPRETED: &str = "scan.interpreted";
pub const INTERACTION_RECORD: &str = "interaction.record";
