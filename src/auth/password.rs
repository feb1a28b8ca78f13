use crate::error::AppError;

/// Hash a password off the async runtime; bcrypt is deliberately slow.
pub async fn hash_password(plain: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(plain: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("correct horse".into(), 4)
            .await
            .unwrap();
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        assert!(!verify_password("x".into(), "not-a-hash".into()).await.unwrap());
    }
}
