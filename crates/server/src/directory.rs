//! In-memory user store backing the demo endpoints.

use std::{
    cmp::Ordering,
    sync::{PoisonError, RwLock},
};

use shared::{
    domain::{SortDirection, Sorting, UserId, UserRecord},
    error::ApiError,
};

pub const SORTABLE_FIELDS: [&str; 5] = ["id", "name", "document", "email", "phone"];

const FIRST_NAMES: [&str; 8] = [
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gloria", "Hugo",
];
const LAST_NAMES: [&str; 6] = ["Silva", "Souza", "Costa", "Lima", "Rocha", "Alves"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSlice {
    pub users: Vec<UserRecord>,
    pub total_items: u64,
}

pub struct UserDirectory {
    users: RwLock<Vec<UserRecord>>,
}

impl UserDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Deterministic demo data with ids starting at 1.
    pub fn with_sample_users(count: usize) -> Self {
        let users = (0..count)
            .map(|index| {
                let first = FIRST_NAMES[index % FIRST_NAMES.len()];
                let last = LAST_NAMES[(index / FIRST_NAMES.len()) % LAST_NAMES.len()];
                let id = index as i64 + 1;
                UserRecord {
                    id: UserId(id),
                    name: format!("{first} {last}"),
                    document: format!("{:011}", 10_000_000_000 + id * 7_919),
                    email: format!(
                        "{}.{}{id}@example.com",
                        first.to_lowercase(),
                        last.to_lowercase()
                    ),
                    phone: format!("+55 11 9{:04}-{:04}", 1_000 + id, (id * 37) % 10_000),
                }
            })
            .collect();
        Self::new(users)
    }

    pub fn user_count(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Filters by `needle` (case-insensitive, over name, email, document and
    /// phone), orders by `sorting` with ties broken by id, and returns the
    /// window starting at `offset`.
    pub fn search(
        &self,
        needle: &str,
        sorting: &Sorting,
        offset: usize,
        limit: usize,
    ) -> Result<UserSlice, ApiError> {
        if !SORTABLE_FIELDS.contains(&sorting.field.as_str()) {
            return Err(ApiError::validation(format!(
                "invalid sort field: {}",
                sorting.field
            )));
        }

        let needle = needle.trim().to_lowercase();
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        let mut matches: Vec<&UserRecord> = users
            .iter()
            .filter(|user| needle.is_empty() || matches_needle(user, &needle))
            .collect();

        matches.sort_by(|a, b| {
            let ordering = compare_field(a, b, &sorting.field).then(a.id.cmp(&b.id));
            match sorting.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(UserSlice {
            total_items: matches.len() as u64,
            users: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    pub fn delete(&self, id: UserId) -> Result<UserRecord, ApiError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let position = users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| ApiError::not_found(format!("user {id} not found")))?;
        Ok(users.remove(position))
    }
}

fn matches_needle(user: &UserRecord, needle: &str) -> bool {
    [&user.name, &user.email, &user.document, &user.phone]
        .iter()
        .any(|value| value.to_lowercase().contains(needle))
}

fn compare_field(a: &UserRecord, b: &UserRecord, field: &str) -> Ordering {
    match field {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "document" => a.document.cmp(&b.document),
        "email" => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        "phone" => a.phone.cmp(&b.phone),
        _ => a.id.cmp(&b.id),
    }
}
