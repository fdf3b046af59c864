//! Bootstrap of the first administrator.
//!
//! Administrator calls need an administrator, so the first one is written
//! straight into the person directory by the `seed_admin` binary:
//!
//! ```bash
//! SEED_ADMIN_EMAIL=ops@example.com SEED_ADMIN_NAME="Ops" cargo run --bin seed_admin
//! ```
//!
//! Re-running with the same `SEED_ADMIN_ID` refreshes the record.

use seatbook_core::{AllocationError, Person, PersonDirectory, PersonId, Role};
use seatbook_runtime::PersonRecord;

/// Settings for the seeded administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    /// Id to seed; a fresh one when unset
    pub id: PersonId,
    /// Display name
    pub display_name: String,
    /// Contact email
    pub email: String,
}

impl SeedAdmin {
    /// Read `SEED_ADMIN_ID`, `SEED_ADMIN_NAME` and `SEED_ADMIN_EMAIL`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Validation`] when the email is missing or
    /// the id is not a UUID.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AllocationError> {
        let id = match lookup("SEED_ADMIN_ID") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AllocationError::Validation(format!("SEED_ADMIN_ID {raw:?} is not a UUID"))
            })?,
            None => PersonId::new(),
        };
        let email = lookup("SEED_ADMIN_EMAIL")
            .ok_or_else(|| AllocationError::Validation("SEED_ADMIN_EMAIL is required".to_string()))?;

        Ok(Self {
            id,
            display_name: lookup("SEED_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            email,
        })
    }
}

/// Write the administrator into `people`.
///
/// # Errors
///
/// - [`AllocationError::Validation`] for a malformed name or email
/// - [`AllocationError::Internal`] on storage failure
pub async fn seed_admin(
    people: &dyn PersonDirectory,
    seed: SeedAdmin,
) -> Result<Person, AllocationError> {
    let record = PersonRecord {
        role: Role::Administrator,
        display_name: seed.display_name,
        email: seed.email,
    };
    let person = people.upsert_person(record.into_person(seed.id)?).await?;
    tracing::info!(person = %person.id, email = %person.email, "Administrator seeded");
    Ok(person)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatbook_testing::InMemoryStore;
    use std::collections::HashMap;

    fn seed(pairs: &[(&str, &str)]) -> Result<SeedAdmin, AllocationError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SeedAdmin::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn email_is_required_and_ids_must_parse() {
        assert!(seed(&[]).is_err());
        assert!(seed(&[("SEED_ADMIN_EMAIL", "a@b.c"), ("SEED_ADMIN_ID", "x")]).is_err());

        let settings = seed(&[("SEED_ADMIN_EMAIL", "a@b.c")]).unwrap();
        assert_eq!(settings.display_name, "Administrator");
    }

    #[tokio::test]
    async fn seeding_is_repeatable() {
        let store = InMemoryStore::new();
        let id = PersonId::new().to_string();
        let settings = seed(&[
            ("SEED_ADMIN_ID", id.as_str()),
            ("SEED_ADMIN_EMAIL", "ops@example.com"),
            ("SEED_ADMIN_NAME", "Ops"),
        ])
        .unwrap();

        let first = seed_admin(&store, settings.clone()).await.unwrap();
        let again = seed_admin(&store, settings).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(first.role, Role::Administrator);
        assert_eq!(store.person(first.id).await.unwrap().unwrap(), first);
    }
}
