//! Helper registry.
//!
//! Built once per run from the classifier's helper fields. Building allocates every absent helper in place, so the
//! suite's own `Option<Box<_>>` fields are populated when the run is over.
//!
//! The registry does not hold on to the helpers. Test methods need `&mut` access to the whole suite between hook
//! passes, so each pass re-borrows the helpers through [`HelperRegistry::resolve`].

use tracing::debug;

use crate::lifecycle::{Capabilities, Helper};
use crate::members::{HelperField, HelperSlot, Member, SuiteMembers};

/// One registered helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperEntry {
    /// Position in [`SuiteMembers::fields`].
    pub index: usize,
    pub name: &'static str,
    pub capabilities: Capabilities,
}

#[derive(Debug, Default)]
pub struct HelperRegistry {
    entries: Vec<HelperEntry>,
}

impl HelperRegistry {
    /// Allocate absent helpers and record their capabilities, in field order.
    pub fn build<S: SuiteMembers>(suite: &mut S, helpers: &[HelperField]) -> Self {
        Self::register(suite, helpers, true)
    }

    /// Record only the helpers that are already allocated, allocating nothing.
    ///
    /// Used to tear down after [`build`](Self::build) was cut short by a panicking `Default`.
    pub fn allocated<S: SuiteMembers>(suite: &mut S, helpers: &[HelperField]) -> Self {
        Self::register(suite, helpers, false)
    }

    fn register<S: SuiteMembers>(suite: &mut S, helpers: &[HelperField], allocate: bool) -> Self {
        let mut slots = helper_slots(suite);
        let mut entries = Vec::with_capacity(helpers.len());

        for field in helpers {
            let Some(slot) = slots.get_mut(field.index).and_then(Option::as_mut) else {
                debug!(field = field.name, "helper field no longer helper-shaped, skipping");
                continue;
            };
            if !slot.is_allocated() {
                if !allocate {
                    continue;
                }
                debug!(field = field.name, "allocating helper");
                slot.helper_mut();
            }
            entries.push(HelperEntry {
                index: field.index,
                name: field.name,
                capabilities: slot.capabilities(),
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[HelperEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow every registered helper from `suite`, in registration order.
    pub fn resolve<'r, 's, S: SuiteMembers>(
        &'r self,
        suite: &'s mut S,
    ) -> Vec<(&'r HelperEntry, &'s mut (dyn Helper + 's))> {
        let mut slots = helper_slots(suite);
        self.entries
            .iter()
            .filter_map(|entry| {
                let slot = slots.get_mut(entry.index)?.take()?;
                Some((entry, slot.helper_mut()))
            })
            .collect()
    }
}

fn helper_slots<S: SuiteMembers>(suite: &mut S) -> Vec<Option<&mut (dyn HelperSlot + '_)>> {
    suite
        .fields()
        .into_iter()
        .map(|field| match field.into_member() {
            Member::Helper(slot) => Some(slot),
            Member::Marker | Member::Plain => None,
        })
        .collect()
}
