/// Errors when loading the loader configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// One of the sources could not be read or did not match the schema
    #[error("Failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    /// A root without a path
    #[error("Root #{0} has an empty path")]
    EmptyRoot(usize),
    /// No extension to match units with
    #[error("At least one unit extension is required")]
    NoExtensions,
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Extract(Box::new(error))
    }
}
