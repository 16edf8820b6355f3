mod apply;
mod casing;
mod config;
mod planner;
mod watch;

pub use apply::{apply_plan, rename_candidate, undo_last, ApplyResult, RenameFailure, UndoResult};
pub use casing::{compute_renamed_name, to_sentence_case, to_title_case, CasingMode};
pub use config::{app_paths, load_config, save_config, AppConfig, AppPaths, DEFAULT_DELAY_MS};
pub use planner::{
    generate_plan, plan_single_file, PlanOptions, RenameCandidate, RenamePlan, RenameStats,
};
pub use watch::{watch_root, WatchError, WatchOptions};
