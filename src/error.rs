use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the record store")]
    Store,
    #[display("media operation failed")]
    Media,
    #[display("fact not found: {_0}")]
    FactNotFound(#[error(not(source))] String),
    #[display("could not create data directory")]
    DataDir,
}
