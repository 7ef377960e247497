mod cache;
mod change;
mod report;
mod service;
mod yields;

pub use cache::*;
pub use change::*;
pub use report::*;
pub use service::*;
pub use yields::*;
