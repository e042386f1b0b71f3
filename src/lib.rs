//! # ACH Builder
//!
//! Builds, validates, serializes and parses NACHA ACH files: fixed-width
//! 94-character records grouped into a file header, batches of entries
//! with optional addenda, a file control and pad records filling the last
//! block of ten.
//!
//! ## Design Principles
//!
//! - **Declarative records**: every field is formatted by a named rule
//!   (`<-22`, `->10`, `->10-`, `<-1|upcase`) from a shared registry
//! - **Cascading attributes**: attributes set on a file flow to its batches,
//!   and from batches to the records that declare fields of the same name
//! - **Derived controls**: counts, hashes and totals are computed from the tree
//! - **Validated writes**: an invalid file is never written
//!
//! ## Example
//!
//! ```
//! use ach_builder::{File, Validate};
//!
//! let mut file = File::new([
//!     ("company_id", "11-11111"),
//!     ("company_name", "MY COMPANY"),
//!     ("immediate_dest", "123123123"),
//!     ("immediate_origin", "123123123"),
//!     ("immediate_dest_name", "COMMERCE BANK"),
//!     ("immediate_origin_name", "MYCOMPANY"),
//! ])
//! .unwrap();
//!
//! file.batch_with(
//!     [
//!         ("entry_class_code", "WEB"),
//!         ("company_entry_descr", "TV-TELCOM"),
//!         ("effective_date", "110412"),
//!         ("desc_date", "APR 12"),
//!         ("origin_dfi_id", "00000000"),
//!     ],
//!     |batch| {
//!         batch.entry([
//!             ("customer_name", "JOHN SMITH"),
//!             ("customer_acct", "61242882282"),
//!             ("amount", "2501"),
//!             ("routing_number", "010010101"),
//!             ("bank_account", "103030030"),
//!         ])?;
//!         Ok(())
//!     },
//! )
//! .unwrap();
//!
//! assert!(file.valid());
//! let mut out = Vec::new();
//! assert!(file.write(&mut out).unwrap());
//! ```

pub mod association;
pub mod batch;
pub mod component;
pub mod constants;
pub mod error;
pub mod file;
pub mod formatter;
pub mod layout;
pub mod reader;
pub mod record;
pub mod schema;
pub mod summary;
pub mod validation;
pub mod value;

pub use association::{HasMany, LinkedHasMany};
pub use batch::Batch;
pub use component::Component;
pub use error::{AchError, Result};
pub use file::File;
pub use formatter::{Formatter, Justification, Rule, Transform};
pub use layout::{FileLayout, FileLayoutBuilder, Schemas};
pub use reader::Reader;
pub use record::Record;
pub use schema::{DefaultValue, DynamicSchema, Field, Schema, SchemaBuilder};
pub use summary::{BatchSummary, FileSummary};
pub use validation::{Validate, ValidationError, ValidationErrors};
pub use value::{attributes, Attributes, Value};
