use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameDepKind, VoteEntity, VoteTally},
        storage::StorageError,
    },
    error::ServiceError,
    services::catalog_service::load_page,
    state::SharedState,
};

/// Record `user`'s like or dislike of page `name`. A second vote is a conflict.
pub async fn add_vote(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    user: &str,
    like: bool,
) -> Result<VoteTally, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;

    let vote = VoteEntity {
        id: Uuid::new_v4(),
        page_id: page.id,
        user: user.to_owned(),
        like,
        created_at: SystemTime::now(),
    };
    match store.insert_vote(vote).await {
        Ok(()) => {}
        Err(StorageError::Duplicate { .. }) => {
            return Err(ServiceError::Conflict(format!(
                "you have already voted on `{name}`"
            )));
        }
        Err(err) => return Err(err.into()),
    }

    info!(page = %name, user, like, "vote recorded");
    Ok(store.count_votes(page.id).await?)
}

/// Likes and dislikes of page `name`.
pub async fn vote_tally(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
) -> Result<VoteTally, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    Ok(store.count_votes(page.id).await?)
}

/// Interpret the `{like}` route segment.
pub fn parse_like(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        catalog_service,
        test_support::{page_request, state},
    };

    #[tokio::test]
    async fn one_vote_per_user() {
        let state = state();
        catalog_service::create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let tally = add_vote(&state, GameDepKind::Game, "pong", "alice", true)
            .await
            .unwrap();
        assert_eq!(tally, VoteTally { likes: 1, dislikes: 0 });

        let err = add_vote(&state, GameDepKind::Game, "pong", "alice", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        add_vote(&state, GameDepKind::Game, "pong", "bob", false)
            .await
            .unwrap();
        assert_eq!(
            vote_tally(&state, GameDepKind::Game, "pong").await.unwrap(),
            VoteTally { likes: 1, dislikes: 1 }
        );
    }

    #[tokio::test]
    async fn voting_on_missing_page_is_not_found() {
        let state = state();
        let err = add_vote(&state, GameDepKind::Game, "ghost", "alice", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn like_segment_is_case_insensitive() {
        assert!(parse_like("TRUE"));
        assert!(parse_like("true"));
        assert!(!parse_like("false"));
        assert!(!parse_like("yes"));
    }
}
