use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}", missing_message(.0))]
    MissingParameters(Vec<&'static str>),

    #[error("failed to list objects")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("failed to write output")]
    Output(#[from] io::Error),
}

impl Error {
    pub fn remote<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Remote(Box::new(err))
    }
}

fn missing_message(fields: &[&'static str]) -> String {
    fields
        .iter()
        .map(|field| format!("missing parameter: {} is required", field))
        .collect::<Vec<_>>()
        .join("\n")
}
