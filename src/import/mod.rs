pub mod csv_import;
pub mod error;
pub mod header;

pub use csv_import::{import_csv, split_csv_line, tokenize_csv, CsvImport, CsvRow};
pub use error::ImportError;
pub use header::{resolve_header, CanonicalColumn, ColumnMap};
