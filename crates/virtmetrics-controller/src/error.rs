//! Controller metrics errors.

use thiserror::Error;

use crate::client::ClientError;

/// Errors raised while wiring metrics or resolving VM specs.
#[derive(Debug, Error)]
pub enum Error {
    /// Metric definition, timing or registration error.
    #[error(transparent)]
    Metrics(#[from] virtmetrics_core::Error),

    /// A referenced object exists in neither the cache nor the API.
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// A matcher names a kind that cannot be resolved.
    #[error("unsupported {matcher} kind: {kind}")]
    UnsupportedKind { matcher: &'static str, kind: String },

    /// The VM already sets a value the instance type controls.
    #[error("VM field {field} conflicts with instance type {instancetype}")]
    Conflict { field: String, instancetype: String },

    /// The API request failed.
    #[error("client error: {0}")]
    Client(ClientError),

    /// A stored revision or quantity could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] virtmetrics_api::Error),
}

impl Error {
    /// Whether this is a registry rejection, which must abort startup.
    pub fn is_registration(&self) -> bool {
        matches!(self, Error::Metrics(virtmetrics_core::Error::Registration(_)))
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { kind, key } => Error::NotFound { kind, key },
            other => Error::Client(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_not_found_maps_to_not_found() {
        let err: Error = ClientError::NotFound {
            kind: "VirtualMachineInstancetype",
            key: "ns/small".to_string(),
        }
        .into();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "VirtualMachineInstancetype ns/small not found");
    }

    #[test]
    fn test_registration_detection() {
        let err: Error =
            virtmetrics_core::Error::Registration(virtmetrics_core::RegistrationError::AlreadyReg)
                .into();
        assert!(err.is_registration());

        let err: Error = ClientError::Request {
            code: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(!err.is_registration());
        assert!(matches!(err, Error::Client(_)));
    }
}
