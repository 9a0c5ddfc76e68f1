pub mod error;
pub mod ids;
pub mod record;

pub use error::*;
pub use ids::*;
pub use record::*;
