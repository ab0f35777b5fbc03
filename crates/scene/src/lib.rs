pub mod join;
pub mod partner;
pub mod province;
pub mod report;

pub use join::*;
pub use partner::*;
pub use province::*;
pub use report::*;
