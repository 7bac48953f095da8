pub mod names;
pub mod report;
pub mod session;
pub mod store;
pub mod template;
pub mod tracker;

pub use crate::domain::model::{Bouquet, Connectivity, ConnectivitySet, Device};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
