use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{SharedWatchlistStore, UserStore},
    error::{AppError, AppResult},
    models::{
        normalize_username, rating::validate_score, SharedWatchlist, SharedWatchlistDraft,
        SharedWatchlistPatch, User,
    },
};

use super::watchlist::validate_title_id;

/// Owns group watchlists: membership, entries and per-member scores
///
/// Membership is recorded on both sides (the watchlist's member set and each
/// user's membership list). The two are separate documents and are written
/// one after the other without a transaction.
#[derive(Clone)]
pub struct SharedWatchlistService {
    shared: Arc<dyn SharedWatchlistStore>,
    users: Arc<dyn UserStore>,
}

impl SharedWatchlistService {
    pub fn new(shared: Arc<dyn SharedWatchlistStore>, users: Arc<dyn UserStore>) -> Self {
        Self { shared, users }
    }

    /// Watchlists on the user's membership list; ids that no longer resolve are skipped
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<SharedWatchlist>> {
        let user = self.user_by_id(user_id).await?;

        let mut watchlists = Vec::with_capacity(user.shared_watchlists.len());
        for watchlist_id in &user.shared_watchlists {
            match self.shared.find_by_id(*watchlist_id).await? {
                Some(watchlist) => watchlists.push(watchlist),
                None => {
                    tracing::debug!(user_id = %user_id, watchlist_id = %watchlist_id, "Skipping dangling membership");
                }
            }
        }
        Ok(watchlists)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SharedWatchlist> {
        self.load(id).await
    }

    /// Creates a watchlist owned by `owner_id`, who is always a member
    pub async fn create(
        &self,
        draft: SharedWatchlistDraft,
        owner_id: Uuid,
        owner_username: &str,
    ) -> AppResult<SharedWatchlist> {
        if draft.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Watchlist name must not be empty".to_string(),
            ));
        }

        let mut owner = self.user_by_id(owner_id).await?;

        let mut extra_members = Vec::new();
        for member_id in draft.member_ids.iter().filter(|id| **id != owner_id) {
            extra_members.push(self.user_by_id(*member_id).await?);
        }

        let mut watchlist = SharedWatchlist::new(draft.name, draft.description, owner_id);
        for member in &extra_members {
            watchlist.member_ids.insert(member.id);
        }
        self.shared.save(&watchlist).await?;

        owner.join_watchlist(watchlist.id);
        self.users.save(&owner).await?;
        for mut member in extra_members {
            if member.join_watchlist(watchlist.id) {
                self.users.save(&member).await?;
            }
        }

        tracing::info!(
            watchlist_id = %watchlist.id,
            owner = %owner_username,
            members = watchlist.member_ids.len(),
            "Created shared watchlist"
        );
        Ok(watchlist)
    }

    /// Updates name and description only
    pub async fn update(&self, id: Uuid, patch: SharedWatchlistPatch) -> AppResult<SharedWatchlist> {
        if patch.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Watchlist name must not be empty".to_string(),
            ));
        }

        let mut watchlist = self.load(id).await?;
        watchlist.apply_patch(patch);
        self.shared.save(&watchlist).await?;
        Ok(watchlist)
    }

    /// Scrubs the id from every member, then deletes the record
    ///
    /// Missing member records are skipped. A failed member update is logged
    /// and does not stop the remaining cleanup.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let watchlist = self.load(id).await?;

        for member_id in &watchlist.member_ids {
            if let Err(e) = self.detach_member(*member_id, id).await {
                tracing::warn!(
                    error = %e,
                    watchlist_id = %id,
                    user_id = %member_id,
                    "Failed to remove watchlist from member"
                );
            }
        }

        self.shared.delete_by_id(id).await?;
        tracing::info!(watchlist_id = %id, "Deleted shared watchlist");
        Ok(())
    }

    /// Adds a member by username; no-op if already a member
    pub async fn add_member(&self, id: Uuid, username: &str) -> AppResult<SharedWatchlist> {
        let mut watchlist = self.load(id).await?;
        let mut user = self.user_by_username(username).await?;

        if watchlist.add_member(user.id) {
            self.shared.save(&watchlist).await?;
            tracing::info!(watchlist_id = %id, username = %username, "Added member");
        }
        if user.join_watchlist(id) {
            self.users.save(&user).await?;
        }
        Ok(watchlist)
    }

    /// Removes a member by username; the owner cannot be removed
    pub async fn remove_member(&self, id: Uuid, username: &str) -> AppResult<SharedWatchlist> {
        let mut watchlist = self.load(id).await?;
        let mut user = self.user_by_username(username).await?;

        if watchlist.remove_member(&user.id)? {
            self.shared.save(&watchlist).await?;
            tracing::info!(watchlist_id = %id, username = %username, "Removed member");
        }
        if user.leave_watchlist(&id) {
            self.users.save(&user).await?;
        }
        Ok(watchlist)
    }

    /// Adds an entry for the title; no-op if it already has one
    pub async fn add_title(
        &self,
        id: Uuid,
        title_id: &str,
        added_by_username: &str,
    ) -> AppResult<SharedWatchlist> {
        validate_title_id(title_id)?;

        let mut watchlist = self.load(id).await?;
        if watchlist.add_title(title_id, added_by_username) {
            self.shared.save(&watchlist).await?;
        }
        Ok(watchlist)
    }

    pub async fn remove_title(&self, id: Uuid, title_id: &str) -> AppResult<SharedWatchlist> {
        let mut watchlist = self.load(id).await?;
        if watchlist.remove_title(title_id) {
            self.shared.save(&watchlist).await?;
        }
        Ok(watchlist)
    }

    /// Records a member's score for a title already on the watchlist
    pub async fn rate(
        &self,
        id: Uuid,
        title_id: &str,
        user_id: Uuid,
        score: f64,
    ) -> AppResult<SharedWatchlist> {
        validate_score("rating", score)?;

        let mut watchlist = self.load(id).await?;
        watchlist.rate(title_id, user_id, score)?;
        self.shared.save(&watchlist).await?;

        tracing::info!(
            watchlist_id = %id,
            title_id = %title_id,
            user_id = %user_id,
            watched = watchlist.is_fully_rated(title_id),
            "Recorded shared rating"
        );
        Ok(watchlist)
    }

    /// Whether every current member has rated the title
    pub async fn is_fully_rated(&self, id: Uuid, title_id: &str) -> AppResult<bool> {
        Ok(self.load(id).await?.is_fully_rated(title_id))
    }

    async fn load(&self, id: Uuid) -> AppResult<SharedWatchlist> {
        self.shared
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Watchlist not found".to_string()))
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn user_by_username(&self, username: &str) -> AppResult<User> {
        self.users
            .find_by_username(normalize_username(username))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    async fn detach_member(&self, user_id: Uuid, watchlist_id: Uuid) -> AppResult<()> {
        let Some(mut user) = self.users.find_by_id(user_id).await? else {
            return Ok(());
        };
        if user.leave_watchlist(&watchlist_id) {
            self.users.save(&user).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockUserStore};
    use std::collections::BTreeSet;

    struct Fixture {
        service: SharedWatchlistService,
        store: Arc<MemoryStore>,
        alice: User,
        bob: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = User::new("alice".to_string(), "hash".to_string());
        let bob = User::new("bob".to_string(), "hash".to_string());
        UserStore::save(store.as_ref(), &alice).await.unwrap();
        UserStore::save(store.as_ref(), &bob).await.unwrap();
        Fixture {
            service: SharedWatchlistService::new(store.clone(), store.clone()),
            store,
            alice,
            bob,
        }
    }

    fn draft(name: &str) -> SharedWatchlistDraft {
        SharedWatchlistDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    async fn reload_user(store: &MemoryStore, id: Uuid) -> User {
        UserStore::find_by_id(store, id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_registers_owner_membership() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("Movie night"), f.alice.id, "alice")
            .await
            .unwrap();

        assert_eq!(watchlist.owner_id, f.alice.id);
        assert_eq!(watchlist.member_ids, BTreeSet::from([f.alice.id]));
        let alice = reload_user(&f.store, f.alice.id).await;
        assert_eq!(alice.shared_watchlists, vec![watchlist.id]);
    }

    #[tokio::test]
    async fn test_create_with_extra_members() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(
                SharedWatchlistDraft {
                    name: "Duo".to_string(),
                    description: None,
                    member_ids: vec![f.bob.id, f.alice.id],
                },
                f.alice.id,
                "alice",
            )
            .await
            .unwrap();

        assert_eq!(watchlist.member_ids.len(), 2);
        let bob = reload_user(&f.store, f.bob.id).await;
        assert!(bob.is_member_of(&watchlist.id));
    }

    #[tokio::test]
    async fn test_create_with_unknown_member_writes_nothing() {
        let f = fixture().await;
        let err = f
            .service
            .create(
                SharedWatchlistDraft {
                    name: "Ghosts".to_string(),
                    description: None,
                    member_ids: vec![Uuid::new_v4()],
                },
                f.alice.id,
                "alice",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.store.find_by_member(f.alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .create(draft("   "), f.alice.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_single_member_then_join_scenario() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();

        f.service
            .add_title(watchlist.id, "tt001", "alice")
            .await
            .unwrap();
        let rated = f
            .service
            .rate(watchlist.id, "tt001", f.alice.id, 8.0)
            .await
            .unwrap();
        assert!(rated.movies["tt001"].watched);

        let joined = f.service.add_member(watchlist.id, "bob").await.unwrap();
        assert!(!joined.movies["tt001"].watched);
        assert!(!f.service.is_fully_rated(watchlist.id, "tt001").await.unwrap());

        let bob = reload_user(&f.store, f.bob.id).await;
        assert!(bob.is_member_of(&watchlist.id));
    }

    #[tokio::test]
    async fn test_add_member_is_idempotent() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();

        f.service.add_member(watchlist.id, "bob").await.unwrap();
        let again = f.service.add_member(watchlist.id, "bob").await.unwrap();

        assert_eq!(again.member_ids.len(), 2);
        let bob = reload_user(&f.store, f.bob.id).await;
        assert_eq!(bob.shared_watchlists, vec![watchlist.id]);
    }

    #[tokio::test]
    async fn test_add_unknown_member_not_found() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        let err = f
            .service
            .add_member(watchlist.id, "carol")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_owner_rejected_and_membership_unchanged() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        f.service.add_member(watchlist.id, "bob").await.unwrap();

        let err = f
            .service
            .remove_member(watchlist.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let current = f.service.get(watchlist.id).await.unwrap();
        assert_eq!(current.member_ids, BTreeSet::from([f.alice.id, f.bob.id]));
        let alice = reload_user(&f.store, f.alice.id).await;
        assert!(alice.is_member_of(&watchlist.id));
    }

    #[tokio::test]
    async fn test_remove_member_recomputes_watched() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        f.service.add_member(watchlist.id, "bob").await.unwrap();
        f.service
            .add_title(watchlist.id, "tt001", "bob")
            .await
            .unwrap();
        f.service
            .rate(watchlist.id, "tt001", f.alice.id, 6.0)
            .await
            .unwrap();
        assert!(!f.service.is_fully_rated(watchlist.id, "tt001").await.unwrap());

        let after = f.service.remove_member(watchlist.id, "bob").await.unwrap();
        assert!(after.movies["tt001"].watched);
        let bob = reload_user(&f.store, f.bob.id).await;
        assert!(!bob.is_member_of(&watchlist.id));
    }

    #[tokio::test]
    async fn test_rate_absent_title_not_found() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();

        let err = f
            .service
            .rate(watchlist.id, "tt404", f.alice.id, 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.service.get(watchlist.id).await.unwrap().movies.is_empty());
    }

    #[tokio::test]
    async fn test_rate_out_of_range_rejected() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        f.service
            .add_title(watchlist.id, "tt001", "alice")
            .await
            .unwrap();

        let err = f
            .service
            .rate(watchlist.id, "tt001", f.alice.id, 42.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(f.service.get(watchlist.id).await.unwrap().movies["tt001"]
            .ratings
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_metadata() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        f.service
            .add_title(watchlist.id, "tt001", "alice")
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                watchlist.id,
                SharedWatchlistPatch {
                    name: "Renamed".to_string(),
                    description: Some("Sunday picks".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.description.as_deref(), Some("Sunday picks"));
        assert_eq!(updated.member_ids, watchlist.member_ids);
        assert!(updated.movies.contains_key("tt001"));
        assert!(updated.last_updated > watchlist.last_updated);
    }

    #[tokio::test]
    async fn test_delete_scrubs_members() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();
        f.service.add_member(watchlist.id, "bob").await.unwrap();
        // A member whose record vanished is skipped
        UserStore::delete_by_id(f.store.as_ref(), f.bob.id)
            .await
            .unwrap();

        f.service.delete(watchlist.id).await.unwrap();

        assert!(matches!(
            f.service.get(watchlist.id).await,
            Err(AppError::NotFound(_))
        ));
        let alice = reload_user(&f.store, f.alice.id).await;
        assert!(alice.shared_watchlists.is_empty());
    }

    #[tokio::test]
    async fn test_delete_continues_past_failed_member_update() {
        let shared = Arc::new(MemoryStore::new());
        let mut alice = User::new("alice".to_string(), "hash".to_string());
        let mut bob = User::new("bob".to_string(), "hash".to_string());
        let mut carol = User::new("carol".to_string(), "hash".to_string());

        let mut watchlist = SharedWatchlist::new("W".to_string(), None, alice.id);
        watchlist.add_member(bob.id);
        watchlist.add_member(carol.id);
        SharedWatchlistStore::save(shared.as_ref(), &watchlist)
            .await
            .unwrap();
        for user in [&mut alice, &mut bob, &mut carol] {
            user.join_watchlist(watchlist.id);
        }

        let records = [alice.clone(), bob.clone(), carol.clone()];
        let bob_id = bob.id;
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(records.iter().find(|u| u.id == id).cloned()));
        users
            .expect_save()
            .withf(move |u: &User| u.id == bob_id)
            .times(1)
            .returning(|_| Err(AppError::Internal("write failed".to_string())));
        users
            .expect_save()
            .withf(move |u: &User| u.id != bob_id && u.shared_watchlists.is_empty())
            .times(2)
            .returning(|_| Ok(()));

        let service = SharedWatchlistService::new(shared.clone(), Arc::new(users));
        service.delete(watchlist.id).await.unwrap();

        assert!(SharedWatchlistStore::find_by_id(shared.as_ref(), watchlist.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_skips_dangling_ids() {
        let f = fixture().await;
        let kept = f
            .service
            .create(draft("Kept"), f.alice.id, "alice")
            .await
            .unwrap();

        let mut alice = reload_user(&f.store, f.alice.id).await;
        alice.join_watchlist(Uuid::new_v4());
        UserStore::save(f.store.as_ref(), &alice).await.unwrap();

        let listed = f.service.list_for_user(f.alice.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_add_and_remove_title_idempotent() {
        let f = fixture().await;
        let watchlist = f
            .service
            .create(draft("W"), f.alice.id, "alice")
            .await
            .unwrap();

        f.service
            .add_title(watchlist.id, "tt001", "alice")
            .await
            .unwrap();
        let again = f
            .service
            .add_title(watchlist.id, "tt001", "bob")
            .await
            .unwrap();
        assert_eq!(again.movies["tt001"].added_by_username, "alice");

        f.service.remove_title(watchlist.id, "tt001").await.unwrap();
        let gone = f.service.remove_title(watchlist.id, "tt001").await.unwrap();
        assert!(gone.movies.is_empty());
    }
}
