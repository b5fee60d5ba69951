use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// SDK エラーの分類。サービスがエラーコードを返した場合のみ `Service` になる。
#[derive(Debug)]
pub(crate) enum AwsFailure {
    Service { code: String, message: String },
    Transport(String),
}

pub(crate) fn classify<E, R>(err: SdkError<E, R>) -> AwsFailure
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(ctx) = &err {
        if let Some(code) = ctx.err().code() {
            return AwsFailure::Service {
                code: code.to_string(),
                message: ctx.err().message().unwrap_or(code).to_string(),
            };
        }
    }
    AwsFailure::Transport(DisplayErrorContext(&err).to_string())
}
