pub mod import;
pub mod settings;
pub mod stats;
pub mod summary;
pub mod trades;

pub use import::*;
pub use settings::*;
pub use stats::*;
pub use summary::*;
pub use trades::*;
