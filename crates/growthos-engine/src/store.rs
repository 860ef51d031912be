//! In-memory lead store.

use std::collections::HashMap;

use growthos_core::{Lead, LeadId};

/// Leads keyed by id. Entries live until [`LeadStore::clear`].
#[derive(Debug, Default)]
pub struct LeadStore {
    leads: HashMap<LeadId, Lead>,
}

impl LeadStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a lead, replacing any previous record with the same id.
    pub fn insert(&mut self, lead: Lead) -> Option<Lead> {
        self.leads.insert(lead.id.clone(), lead)
    }

    /// Look up a lead.
    #[must_use]
    pub fn get(&self, id: &LeadId) -> Option<&Lead> {
        self.leads.get(id)
    }

    /// Look up a lead for mutation.
    pub fn get_mut(&mut self, id: &LeadId) -> Option<&mut Lead> {
        self.leads.get_mut(id)
    }

    /// Whether the store holds `id`.
    #[must_use]
    pub fn contains(&self, id: &LeadId) -> bool {
        self.leads.contains_key(id)
    }

    /// Number of stored leads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Iterate over all leads in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Lead> {
        self.leads.values()
    }

    /// Drop every lead.
    pub fn clear(&mut self) {
        self.leads.clear();
    }
}
