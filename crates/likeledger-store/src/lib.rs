pub mod codec;
pub mod durable;
pub mod file;
pub mod memory;
pub mod options;
pub mod traits;

pub use durable::*;
pub use file::*;
pub use memory::*;
pub use options::*;
pub use traits::*;
