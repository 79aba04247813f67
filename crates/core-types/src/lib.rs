pub mod enums;
pub mod error;
pub mod index;
pub mod structs;
pub mod table;

// Re-export the core types to provide a clean public API.
pub use enums::Stage;
pub use error::CoreError;
pub use index::RegionIndex;
pub use structs::{Alpha, Region};
pub use table::{PnlSeries, PnlTable, ReturnSeries};
