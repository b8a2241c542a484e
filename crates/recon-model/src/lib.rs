pub mod error;
pub mod layout;
pub mod mapping;
pub mod options;
pub mod table;

pub use error::{ReconError, Result};
pub use layout::{FieldDelimiter, FieldRange, MappingLayout, ValueFields};
pub use mapping::{DEFAULT_VALUE_SEPARATOR, Mapping};
pub use options::{
    ColumnSource, DuplicatePolicy, EnrichCondition, IdentifierRule, MissPolicy, RecodeInto,
    RecodeMap, RewriteGuard,
};
pub use table::Table;
