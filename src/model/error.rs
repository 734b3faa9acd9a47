use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SimError {
    #[error("simulation has not been started")]
    NotInitialized,

    #[error("no stored configuration to extend the simulation with")]
    MissingConfig,

    #[error("no posts to export, run at least one round first")]
    EmptyExport,
}
