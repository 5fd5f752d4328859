mod field;
mod record;
mod summary;
mod table;

pub use field::{Field, FieldSpec, Projection};
pub use record::{FlatRecord, as_number, as_text, flatten};
pub use summary::{SummaryEntry, SummaryReport, SummaryValue};
pub use table::Table;
