use derive_more::Display;
use types::errors::PayError;

#[derive(Debug, Display)]
pub enum CliError {
    #[display("{}", _0)]
    Pay(PayError),

    #[display("Io error: {}", _0)]
    Io(std::io::Error),

    #[display("Status watcher stopped unexpectedly: {}", _0)]
    Watch(String),
}

impl std::error::Error for CliError {}

impl From<PayError> for CliError {
    fn from(error: PayError) -> Self {
        CliError::Pay(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}
