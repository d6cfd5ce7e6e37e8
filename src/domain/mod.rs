mod history;
mod inventory;
mod ledger;
mod location;
mod waste;

pub use history::*;
pub use inventory::*;
pub use ledger::*;
pub use location::*;
pub use waste::*;
