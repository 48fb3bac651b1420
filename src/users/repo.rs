use time::OffsetDateTime;

use crate::users::model::{NewUser, PublicUser, Role, Stats, Status, User, UserChanges};

/// Filters for [`UserStore::list`]. Every set filter must match.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub role: Option<Role>,
    pub status: Option<Status>,
    /// Case-insensitive substring of first name, last name, email or username.
    pub search: Option<String>,
}

impl ListFilter {
    fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        if self.status.is_some_and(|s| s != user.status) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [&user.first_name, &user.last_name, &user.email, &user.username]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}

/// In-memory member collection in insertion order.
///
/// The store does not enforce username/email uniqueness; callers check with
/// [`get_by_email`](Self::get_by_email) / [`get_by_username`](Self::get_by_username)
/// while holding the same write guard they create or update under.
#[derive(Debug)]
pub struct UserStore {
    users: Vec<User>,
    next_id: u64,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            next_id: 1,
        }
    }

    /// Store pre-filled with the three demo members, all sharing `password_hash`.
    pub fn with_demo_users(password_hash: &str) -> Self {
        let mut store = Self::new();
        let demo = [
            ("admin", "admin@college.edu", "Admin", "User", "1234567890", Role::Admin),
            ("john_doe", "john@college.edu", "John", "Doe", "9876543210", Role::Student),
            ("jane_smith", "jane@college.edu", "Jane", "Smith", "5551234567", Role::Alumni),
        ];
        for (username, email, first, last, mobile, role) in demo {
            store.create(NewUser {
                username: username.into(),
                email: email.into(),
                password_hash: password_hash.into(),
                first_name: first.into(),
                last_name: last.into(),
                mobile: Some(mobile.into()),
                role,
                status: Status::Active,
            });
        }
        store
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<PublicUser> {
        self.users
            .iter()
            .filter(|u| filter.matches(u))
            .map(PublicUser::from)
            .collect()
    }

    pub fn get_by_id(&self, id: u64) -> Option<PublicUser> {
        self.find(id).map(PublicUser::from)
    }

    /// Full record including the hash; for credential checks only.
    pub fn get_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Full record including the hash; for credential checks only.
    pub fn get_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn create(&mut self, new: NewUser) -> PublicUser {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: self.next_id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            mobile: new.mobile,
            role: new.role,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        let public = PublicUser::from(&user);
        self.users.push(user);
        public
    }

    pub fn update(&mut self, id: u64, changes: UserChanges) -> Option<PublicUser> {
        let user = self.users.iter_mut().find(|u| u.id == id)?;
        let UserChanges {
            username,
            email,
            password_hash,
            first_name,
            last_name,
            mobile,
            role,
            status,
        } = changes;

        if let Some(v) = username {
            user.username = v;
        }
        if let Some(v) = email {
            user.email = v;
        }
        // an empty hash would lock the member out
        if let Some(v) = password_hash.filter(|h| !h.is_empty()) {
            user.password_hash = v;
        }
        if let Some(v) = first_name {
            user.first_name = v;
        }
        if let Some(v) = last_name {
            user.last_name = v;
        }
        if let Some(v) = mobile {
            user.mobile = Some(v);
        }
        if let Some(v) = role {
            user.role = v;
        }
        if let Some(v) = status {
            user.status = v;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Some(PublicUser::from(&*user))
    }

    pub fn delete(&mut self, id: u64) -> Option<PublicUser> {
        let index = self.users.iter().position(|u| u.id == id)?;
        let removed = self.users.remove(index);
        Some(PublicUser::from(&removed))
    }

    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            total: self.users.len(),
            ..Default::default()
        };
        for user in &self.users {
            match user.role {
                Role::Student => stats.by_role.student += 1,
                Role::Alumni => stats.by_role.alumni += 1,
                Role::Admin => stats.by_role.admin += 1,
            }
            match user.status {
                Status::Active => stats.by_status.active += 1,
                Status::Inactive => stats.by_status.inactive += 1,
            }
        }
        stats
    }

    fn find(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{RoleCounts, StatusCounts};

    fn new_user(username: &str, first: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{username}@college.edu"),
            password_hash: format!("hash-of-{username}"),
            first_name: first.into(),
            last_name: "Tester".into(),
            mobile: None,
            role,
            status: Status::Active,
        }
    }

    fn three_member_store() -> UserStore {
        let mut store = UserStore::new();
        store.create(new_user("boss", "Ada", Role::Admin));
        store.create(new_user("jsmith", "Jane", Role::Alumni));
        store.create(new_user("kid", "Tom", Role::Student));
        store
    }

    #[test]
    fn create_assigns_sequential_ids_and_timestamps() {
        let mut store = UserStore::new();
        let a = store.create(new_user("a", "A", Role::Student));
        let b = store.create(new_user("b", "B", Role::Student));
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = UserStore::new();
        store.create(new_user("a", "A", Role::Student));
        let b = store.create(new_user("b", "B", Role::Student));
        store.delete(b.id).unwrap();
        let c = store.create(new_user("c", "C", Role::Student));
        assert_eq!(c.id, 3);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let store = three_member_store();
        let found = store.list(&ListFilter {
            search: Some("jane".into()),
            ..Default::default()
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Jane");

        let by_email = store.list(&ListFilter {
            search: Some("BOSS@COLLEGE".into()),
            ..Default::default()
        });
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].username, "boss");
    }

    #[test]
    fn role_filter_returns_only_that_role() {
        let mut store = three_member_store();
        store.create(new_user("root", "Grace", Role::Admin));
        let admins = store.list(&ListFilter {
            role: Some(Role::Admin),
            ..Default::default()
        });
        assert_eq!(admins.len(), 2);
        assert!(admins.iter().all(|u| u.role == Role::Admin));
    }

    #[test]
    fn filters_combine_and_keep_insertion_order() {
        let mut store = three_member_store();
        store.update(
            2,
            UserChanges {
                status: Some(Status::Inactive),
                ..Default::default()
            },
        );
        let active = store.list(&ListFilter {
            status: Some(Status::Active),
            search: Some("tester".into()),
            ..Default::default()
        });
        let ids: Vec<u64> = active.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn lookups_return_none_when_absent() {
        let store = three_member_store();
        assert!(store.get_by_id(99).is_none());
        assert!(store.get_by_email("nobody@college.edu").is_none());
        assert!(store.get_by_username("Boss").is_none());
        assert_eq!(
            store.get_by_username("boss").unwrap().password_hash,
            "hash-of-boss"
        );
    }

    #[test]
    fn update_without_password_keeps_hash() {
        let mut store = three_member_store();
        let before = store.get_by_id(1).unwrap();
        let updated = store
            .update(
                1,
                UserChanges {
                    first_name: Some("Augusta".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.first_name, "Augusta");
        assert!(updated.updated_at >= before.updated_at);
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(store.get_by_username("boss").unwrap().password_hash, "hash-of-boss");
    }

    #[test]
    fn update_with_password_replaces_hash() {
        let mut store = three_member_store();
        store.update(
            1,
            UserChanges {
                password_hash: Some("new-hash".into()),
                ..Default::default()
            },
        );
        assert_eq!(store.get_by_username("boss").unwrap().password_hash, "new-hash");

        store.update(
            1,
            UserChanges {
                password_hash: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(store.get_by_username("boss").unwrap().password_hash, "new-hash");
    }

    #[test]
    fn update_missing_id_is_none() {
        let mut store = three_member_store();
        assert!(store.update(42, UserChanges::default()).is_none());
    }

    #[test]
    fn delete_removes_record() {
        let mut store = three_member_store();
        assert!(store.delete(99).is_none());
        let removed = store.delete(2).unwrap();
        assert_eq!(removed.username, "jsmith");
        assert!(store.get_by_id(2).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn stats_count_every_group() {
        let store = three_member_store();
        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.by_role,
            RoleCounts {
                student: 1,
                alumni: 1,
                admin: 1
            }
        );
        assert_eq!(
            stats.by_status,
            StatusCounts {
                active: 3,
                inactive: 0
            }
        );
    }

    #[test]
    fn stats_count_inactive_members() {
        let mut store = three_member_store();
        store
            .update(
                2,
                UserChanges {
                    status: Some(Status::Inactive),
                    ..Default::default()
                },
            )
            .expect("jsmith exists");
        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.by_status,
            StatusCounts {
                active: 2,
                inactive: 1
            }
        );
        assert_eq!(stats.by_role.alumni, 1);
    }

    #[test]
    fn demo_store_has_three_members_and_next_id_four() {
        let mut store = UserStore::with_demo_users("demo-hash");
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_by_email("jane@college.edu").unwrap().id, 3);
        let next = store.create(new_user("new", "New", Role::Student));
        assert_eq!(next.id, 4);
    }
}
