mod fsio;
mod pending;
mod store;

pub use fsio::{load_dir, save_dir};
pub use pending::{ChangeLabel, ChangeSummary, PendingChanges};
pub use store::Workspace;
