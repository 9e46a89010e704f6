pub mod enums;
pub mod record;
pub mod scan;

pub use enums::*;
pub use record::*;
pub use scan::*;
