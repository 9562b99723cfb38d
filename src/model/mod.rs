pub mod common;
pub mod release;
pub mod repository;
pub mod tags;
pub mod user_context;

pub use common::*;
pub use release::*;
pub use repository::*;
pub use tags::*;
pub use user_context::*;
