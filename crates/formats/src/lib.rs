pub mod boundaries;
pub mod cache;
pub mod source;
pub mod trade_table;

pub use boundaries::*;
pub use cache::*;
pub use source::*;
pub use trade_table::*;
