//! Contracts shared between importers, the call-tree core and consumers:
//! frame descriptors, value units and the persisted interchange document.

pub mod frame;
pub mod profile_file;
pub mod shared_str;
pub mod value_unit;

pub use frame::{FrameInfo, FrameKey};
pub use profile_file::{NodeRecord, ProfileFile};
pub use shared_str::SharedStr;
pub use value_unit::ValueUnit;
