use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("document store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("group not found: {0}")]
    GroupNotFound(Uuid),

    #[error("member {platform}/{product_id} not found in group {group_id}")]
    MemberNotFound {
        group_id: Uuid,
        platform: String,
        product_id: String,
    },

    #[error("cannot merge group {0} into itself")]
    MergeIntoSelf(Uuid),
}

impl GroupingError {
    /// Wrap a backend-specific store error.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GroupingError::Store(Box::new(err))
    }
}
