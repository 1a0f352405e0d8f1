pub mod error;
pub mod key;
pub mod types;

pub use error::{Result, StoreError};
pub use types::{MedicalRecord, Person, StationMapping};
