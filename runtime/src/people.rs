//! Person records fed by the identity collaborator.
//!
//! The directory only mirrors what the identity side publishes. Records
//! arrive through an administrator call ([`PeopleRegistry::register`]) or
//! through the `seed_admin` bootstrap binary, which writes the first
//! administrator before any caller could hold the capability.

use crate::metrics;
use seatbook_core::{AdminCapability, AllocationError, Person, PersonDirectory, PersonId, Role};
use serde::Deserialize;
use std::sync::Arc;

/// A person's published attributes, keyed elsewhere by id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PersonRecord {
    /// Role granted by the identity collaborator
    pub role: Role,
    /// Display name
    pub display_name: String,
    /// Contact email
    pub email: String,
}

impl PersonRecord {
    /// Validate and trim the record into a [`Person`].
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Validation`] for a blank name or an email
    /// without a local part and a domain.
    pub fn into_person(self, id: PersonId) -> Result<Person, AllocationError> {
        let display_name = self.display_name.trim();
        if display_name.is_empty() {
            return Err(AllocationError::Validation(
                "display_name must not be blank".to_string(),
            ));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {},
            _ => {
                return Err(AllocationError::Validation(format!(
                    "email {email:?} is not an address"
                )));
            },
        }

        Ok(Person {
            id,
            role: self.role,
            display_name: display_name.to_string(),
            email: email.to_string(),
        })
    }
}

/// Writes person records into the directory.
#[derive(Clone)]
pub struct PeopleRegistry {
    people: Arc<dyn PersonDirectory>,
}

impl PeopleRegistry {
    /// Creates a new `PeopleRegistry`
    #[must_use]
    pub fn new(people: Arc<dyn PersonDirectory>) -> Self {
        Self { people }
    }

    /// Insert `id`, or replace its record.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Validation`] for a malformed record
    /// - [`AllocationError::Internal`] on storage failure
    #[tracing::instrument(skip(self, admin, record), fields(admin = %admin.admin()))]
    pub async fn register(
        &self,
        admin: &AdminCapability,
        id: PersonId,
        record: PersonRecord,
    ) -> Result<Person, AllocationError> {
        let person = self.people.upsert_person(record.into_person(id)?).await?;

        metrics::record_person_registered(person.role.as_str());
        tracing::info!(person = %person.id, role = %person.role, "Person registered");
        Ok(person)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatbook_core::Caller;
    use seatbook_testing::InMemoryStore;

    fn record(role: Role, name: &str, email: &str) -> PersonRecord {
        PersonRecord {
            role,
            display_name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn register_writes_and_replaces_records() {
        let store = Arc::new(InMemoryStore::new());
        let registry = PeopleRegistry::new(Arc::clone(&store) as Arc<dyn PersonDirectory>);
        let admin = Caller::administrator(PersonId::new()).require_admin().unwrap();
        let id = PersonId::new();

        let person = registry
            .register(&admin, id, record(Role::Member, "  Ada ", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(person.display_name, "Ada");
        assert_eq!(store.person(id).await.unwrap().unwrap(), person);

        registry
            .register(&admin, id, record(Role::Administrator, "Ada", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(
            store.person(id).await.unwrap().unwrap().role,
            Role::Administrator
        );
    }

    #[test]
    fn malformed_records_are_rejected() {
        for (name, email) in [("", "ada@example.com"), ("Ada", "ada"), ("Ada", "@example.com")] {
            let err = record(Role::Member, name, email)
                .into_person(PersonId::new())
                .unwrap_err();
            assert!(matches!(err, AllocationError::Validation(_)), "{name} {email}");
        }
    }
}
