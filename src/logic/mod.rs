pub mod compare;
pub mod latest;
pub mod lifecycle;
pub mod listing;
pub mod paginate;
pub mod tag_listing;
pub mod visibility;

pub use compare::*;
pub use latest::*;
pub use lifecycle::*;
pub use listing::*;
pub use paginate::*;
pub use tag_listing::*;
pub use visibility::*;
