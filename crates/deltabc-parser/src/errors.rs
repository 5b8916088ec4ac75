use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} could not read {}: {source}", path.display())]
    Io {
        parser: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} is missing required column '{column}'")]
    MissingColumn {
        parser: &'static str,
        column: String,
    },

    #[error("{parser} header lists column '{column}' more than once")]
    DuplicateColumn {
        parser: &'static str,
        column: String,
    },

    #[error("{parser} data row {line_index} invalid: {message}")]
    DataRow {
        parser: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("{parser} data row {line_index} has unparseable date '{value}'")]
    InvalidDate {
        parser: &'static str,
        line_index: usize,
        value: String,
    },

    #[error("{parser} validation error: {message}")]
    Validation {
        parser: &'static str,
        message: String,
    },

    #[error("{parser} file did not contain any data rows")]
    EmptyData { parser: &'static str },
}

impl ParserError {
    pub fn parser(&self) -> &'static str {
        match self {
            ParserError::Io { parser, .. }
            | ParserError::Csv { parser, .. }
            | ParserError::MissingColumn { parser, .. }
            | ParserError::DuplicateColumn { parser, .. }
            | ParserError::DataRow { parser, .. }
            | ParserError::InvalidDate { parser, .. }
            | ParserError::Validation { parser, .. }
            | ParserError::EmptyData { parser } => parser,
        }
    }
}
