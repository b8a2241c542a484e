//! Metadata table transformations.
//!
//! - **identifier**: pure identifier rewrite rules and their validation
//! - **rewrite**: guarded identifier rewrites over a whole column
//! - **enrich**: keyed enrichment from an auxiliary mapping
//! - **recode**: finite value-to-value substitution
//! - **columns**: insert, overwrite, delete and rename columns

pub mod columns;
pub mod enrich;
pub mod identifier;
pub mod recode;
pub mod rewrite;

pub use columns::{delete_column, insert_column, rename_column, resolve_source, set_column};
pub use enrich::{EnrichStats, enrich_column};
pub use identifier::{is_applied, transform_identifier, validate_identifier, validate_rule};
pub use recode::{recode_column, recode_column_into};
pub use rewrite::{RewriteStats, rewrite_column};
