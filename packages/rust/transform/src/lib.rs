//! Pure row-to-contact transformations: deduplication, field mapping, and
//! required-field validation. No I/O lives here.

pub mod dedupe;
pub mod mapper;
pub mod validate;

pub use dedupe::DedupeIndex;
pub use mapper::{DOB_FORMAT, age_on, columns, map_row};
pub use validate::{ValidationOutcome, validate, validate_all};
