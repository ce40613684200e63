mod types;

pub use types::{CatalogError, IngestError, TunerError};

pub type TunerResult<T> = Result<T, TunerError>;
