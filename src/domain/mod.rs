pub mod member;
pub mod dependent;
pub mod attendance;
pub mod admission;

pub use member::*;
pub use dependent::*;
pub use attendance::*;
pub use admission::*;
