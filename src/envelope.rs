use super::DexError;
use serde::Deserialize;

/// Anything decoded from mangadex that carries the `result` status field.
pub trait ApiResult {
    fn result(&self) -> &str;

    fn errors(&self) -> &[ApiErrorDetail] {
        &[]
    }
}

/// One entry of the `errors` array mangadex sends alongside `"result": "error"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiErrorDetail {
    pub id: String,
    pub status: u16,
    pub title: String,
    pub detail: Option<String>,
}

/// The bare envelope, for operations whose payload nobody reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    pub result: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

macro_rules! impl_api_result {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::envelope::ApiResult for $ty {
                fn result(&self) -> &str {
                    &self.result
                }

                fn errors(&self) -> &[$crate::envelope::ApiErrorDetail] {
                    &self.errors
                }
            }
        )+
    };
}

pub(crate) use impl_api_result;

impl_api_result!(Envelope);

/// Turns a decoded envelope whose result isn't `ok` into [`DexError::ApiError`].
///
/// Transport and decode errors are passed through untouched.
pub fn check_error_and_result<R: ApiResult>(res: Result<R, DexError>) -> Result<R, DexError> {
    let r = res?;
    if r.result() == "ok" {
        Ok(r)
    } else {
        Err(DexError::ApiError {
            result: r.result().to_string(),
            errors: r.errors().to_vec(),
        })
    }
}

pub(crate) fn describe(result: &str, errors: &[ApiErrorDetail]) -> String {
    match errors.first() {
        Some(e) => {
            let detail = e.detail.as_deref().unwrap_or(&e.title);
            format!("mangadex returned '{result}' ({}): {detail}", e.status)
        }
        None => format!("mangadex returned '{result}'"),
    }
}
