//! 협조적 취소 -- 외부 호출을 취소 토큰과 경합시킵니다.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use logforward_core::error::StoreError;

use crate::error::CompilerError;

/// `fut`가 끝나기 전에 `cancel`이 트리거되면 [`CompilerError::Cancelled`]를 돌려줍니다.
pub async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, CompilerError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("external call cancelled");
            Err(CompilerError::Cancelled)
        }
        result = fut => result.map_err(|e| match e {
            StoreError::Cancelled => CompilerError::Cancelled,
            other => CompilerError::Store(other),
        }),
    }
}
