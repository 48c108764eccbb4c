//! The set of entity types a store set holds, and the order to load them in.

use crate::{EntitySchema, IdStrategy};
use boxoffice_types::{EntityType, Error, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Entity type names of the booking application.
pub mod types {
    pub const USER: &str = "user";
    pub const CUSTOMER: &str = "customer";
    pub const VENUE_MANAGER: &str = "venue_manager";
    pub const VENUE: &str = "venue";
    pub const SHOW: &str = "show";
    pub const BOOKING: &str = "booking";
    pub const NOTIFICATION: &str = "notification";
}

/// Registry of entity schemas, keyed by type.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<EntityType, EntitySchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The booking application's entity types.
    ///
    /// Venues point at their manager through `manager_id`; the manager's
    /// list of venues is derived by querying on that field, so it is not a
    /// stored dependency.
    pub fn booking() -> Self {
        use types::*;

        let mut catalog = Self::new();
        catalog.register(EntitySchema::new(USER, IdStrategy::Uuid));
        catalog.register(EntitySchema::new(CUSTOMER, IdStrategy::Sequence).references("/user_id", USER));
        catalog.register(
            EntitySchema::new(VENUE_MANAGER, IdStrategy::Sequence).references("/user_id", USER),
        );
        catalog.register(
            EntitySchema::new(VENUE, IdStrategy::Sequence).references("/manager_id", VENUE_MANAGER),
        );
        catalog.register(EntitySchema::new(SHOW, IdStrategy::Sequence).references("/venue_id", VENUE));
        catalog.register(
            EntitySchema::new(BOOKING, IdStrategy::Sequence)
                .references("/customer_id", CUSTOMER)
                .references("/show_id", SHOW),
        );
        catalog.register(
            EntitySchema::new(NOTIFICATION, IdStrategy::Sequence).references("/user_id", USER),
        );
        catalog
    }

    /// Adds or replaces a schema.
    pub fn register(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.entity_type.clone(), schema);
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns every registered type with its dependencies first.
    ///
    /// Ties are broken by name so the order is deterministic. References to
    /// types outside the catalog are ignored. Fails with
    /// [`Error::DependencyCycle`] if no such order exists.
    pub fn bootstrap_order(&self) -> Result<Vec<EntityType>> {
        let mut indegree: BTreeMap<&EntityType, usize> =
            self.schemas.keys().map(|t| (t, 0)).collect();
        let mut dependents: BTreeMap<&EntityType, BTreeSet<&EntityType>> = BTreeMap::new();

        for schema in self.schemas.values() {
            let deps: BTreeSet<&EntityType> = schema
                .dependencies()
                .filter(|d| self.schemas.contains_key(*d))
                .collect();
            for dep in deps {
                dependents.entry(dep).or_default().insert(&schema.entity_type);
                *indegree.entry(&schema.entity_type).or_default() += 1;
            }
        }

        let mut ready: VecDeque<&EntityType> = indegree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(t, _)| *t)
            .collect();
        let mut order = Vec::with_capacity(self.schemas.len());

        while let Some(next) = ready.pop_front() {
            order.push(next.clone());
            if let Some(children) = dependents.get(next) {
                for child in children {
                    if let Some(n) = indegree.get_mut(child) {
                        *n -= 1;
                        if *n == 0 {
                            ready.push_back(*child);
                        }
                    }
                }
            }
        }

        if order.len() != self.schemas.len() {
            let stuck: Vec<&str> = indegree
                .iter()
                .filter(|(_, n)| **n > 0)
                .map(|(t, _)| t.as_str())
                .collect();
            return Err(Error::DependencyCycle(stuck.join(", ")));
        }
        Ok(order)
    }
}
