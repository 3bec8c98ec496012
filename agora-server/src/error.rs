use agora_api::Error as ApiError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    pub fn permission_denied() -> Error {
        Error::Api(ApiError::PermissionDenied)
    }

    pub fn invalid_request(details: impl ToString) -> Error {
        Error::Api(ApiError::InvalidRequest(details.to_string()))
    }
}

impl From<JsonRejection> for Error {
    fn from(rej: JsonRejection) -> Error {
        Error::invalid_request(rej)
    }
}

impl From<QueryRejection> for Error {
    fn from(rej: QueryRejection) -> Error {
        Error::invalid_request(rej)
    }
}

impl From<PathRejection> for Error {
    fn from(rej: PathRejection) -> Error {
        Error::invalid_request(rej)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let err = match self {
            Error::Anyhow(err) => {
                tracing::error!(?err, "internal server error");
                #[cfg(not(test))]
                let err =
                    ApiError::Unknown(String::from("Internal server error, see logs for details"));
                #[cfg(test)]
                let err = ApiError::Unknown(format!("Internal server error: {err:?}"));
                err
            }
            Error::Api(ApiError::InvalidRequest(details)) => {
                tracing::debug!(%details, "rejecting undecodable request");
                ApiError::InvalidRequest(details)
            }
            Error::Api(err) => {
                tracing::info!("returning error to client: {err}");
                err
            }
        };
        (
            err.status_code(),
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            err.contents(),
        )
            .into_response()
    }
}
