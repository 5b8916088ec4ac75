use std::fs;
use std::path::Path;

use crate::errors::ParserError;

pub trait TableParser {
    type Output;

    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<Self::Output, ParserError>;
}

/// Reads a whole file into memory and hands it to `parser`.
pub fn parse_file<P: TableParser>(parser: &P, path: &Path) -> Result<P::Output, ParserError> {
    let content = fs::read_to_string(path).map_err(|source| ParserError::Io {
        parser: parser.name(),
        path: path.to_path_buf(),
        source,
    })?;
    parser.parse(&content)
}

/// Like [`parse_file`], but a file that does not exist yet parses as `None`.
pub fn parse_optional_file<P: TableParser>(
    parser: &P,
    path: &Path,
) -> Result<Option<P::Output>, ParserError> {
    match fs::read_to_string(path) {
        Ok(content) => parser.parse(&content).map(Some),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ParserError::Io {
            parser: parser.name(),
            path: path.to_path_buf(),
            source,
        }),
    }
}
