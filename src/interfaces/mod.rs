pub mod log;
pub mod site;
pub mod store;

pub use log::{ImportLog, NullLog, TracingLog};
pub use site::{Landing, SiteAdapter, SiteContext, SiteProfile};
pub use store::{Store, StoreTx};
