use std::fmt;

#[derive(Debug)]
pub enum SieveError {
    Io(std::io::Error),
    Csv(csv::Error),
    Parse(String),
    NoResults,
    Other(String),
}

impl fmt::Display for SieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SieveError::Io(e) => write!(f, "IO error: {}", e),
            SieveError::Csv(e) => write!(f, "CSV error: {}", e),
            SieveError::Parse(e) => write!(f, "Parse error: {}", e),
            SieveError::NoResults => write!(f, "no scorable results found in any stream file"),
            SieveError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for SieveError {}

impl From<std::io::Error> for SieveError {
    fn from(err: std::io::Error) -> Self {
        SieveError::Io(err)
    }
}

impl From<csv::Error> for SieveError {
    fn from(err: csv::Error) -> Self {
        SieveError::Csv(err)
    }
}

impl From<String> for SieveError {
    fn from(err: String) -> Self {
        SieveError::Other(err)
    }
}

impl From<&str> for SieveError {
    fn from(err: &str) -> Self {
        SieveError::Other(err.to_string())
    }
}
