use std::path::PathBuf;

use thiserror::Error;

use crate::virtual_columns::Side;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Page file {0:?} has an unsupported extension; expected .json or .csv")]
    UnsupportedPageFormat(PathBuf),
    #[error("No page was provided for the {0} side")]
    MissingPage(Side),
    #[error("Filter clause '{0}' must look like <column>=<expression>")]
    InvalidFilterClause(String),
    #[error("{count} virtual column(s) failed validation")]
    InvalidVirtualColumns { count: usize },
}
