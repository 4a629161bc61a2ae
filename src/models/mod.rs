pub mod conversation;
pub mod result;
pub mod stats;

pub use conversation::*;
pub use result::*;
pub use stats::*;
