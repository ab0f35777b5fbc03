pub mod key;
pub mod text;

// Foundation crate: small, well-tested primitives only.
pub use key::*;
pub use text::*;
