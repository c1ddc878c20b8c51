use consult_types::{ConceptId, NonEmptyText};
use fhir::RequestPriority;
use serde::{Deserialize, Serialize};

use super::{ensure_absent, position_of, CategoryStore, FactCategory};
use crate::ConsultResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    Routine,
    Stat,
}

impl OrderPriority {
    pub fn request_priority(self) -> RequestPriority {
        match self {
            OrderPriority::Routine => RequestPriority::Routine,
            OrderPriority::Stat => RequestPriority::Stat,
        }
    }
}

/// One investigation order. Orders are grouped by their category label (laboratory,
/// radiology, ...) for mapping; a concept may be ordered only once whatever its label.
#[derive(Clone, Debug, PartialEq)]
pub struct InvestigationOrder {
    pub concept: ConceptId,
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub category_concept: Option<ConceptId>,
    /// Unset means routine.
    pub priority: Option<OrderPriority>,
}

impl InvestigationOrder {
    pub fn effective_priority(&self) -> RequestPriority {
        self.priority
            .map(OrderPriority::request_priority)
            .unwrap_or_default()
    }
}

/// Orders sharing a category label, in the order the label was first used.
#[derive(Clone, Debug, PartialEq)]
pub struct InvestigationGroup<'a> {
    pub category: &'a NonEmptyText,
    pub category_concept: Option<&'a ConceptId>,
    pub orders: Vec<&'a InvestigationOrder>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvestigationStore {
    orders: Vec<InvestigationOrder>,
}

impl InvestigationStore {
    pub fn add(
        &mut self,
        category: impl AsRef<str>,
        category_concept: Option<ConceptId>,
        concept: ConceptId,
        name: impl AsRef<str>,
    ) -> ConsultResult<()> {
        let category = NonEmptyText::new(category)?;
        ensure_absent(
            &self.orders,
            |o| o.concept == concept,
            Self::CATEGORY,
            &concept,
        )?;
        let name = NonEmptyText::new(name)?;
        self.orders.push(InvestigationOrder {
            concept,
            name,
            category,
            category_concept,
            priority: None,
        });
        Ok(())
    }

    pub fn remove(&mut self, concept: &ConceptId) -> ConsultResult<InvestigationOrder> {
        let idx = self.index_of(concept)?;
        Ok(self.orders.remove(idx))
    }

    pub fn set_priority(&mut self, concept: &ConceptId, priority: OrderPriority) -> ConsultResult<()> {
        let idx = self.index_of(concept)?;
        self.orders[idx].priority = Some(priority);
        Ok(())
    }

    pub fn groups(&self) -> Vec<InvestigationGroup<'_>> {
        let mut groups: Vec<InvestigationGroup<'_>> = Vec::new();
        for order in &self.orders {
            match groups.iter_mut().find(|g| *g.category == order.category) {
                Some(group) => group.orders.push(order),
                None => groups.push(InvestigationGroup {
                    category: &order.category,
                    category_concept: order.category_concept.as_ref(),
                    orders: vec![order],
                }),
            }
        }
        groups
    }

    fn index_of(&self, concept: &ConceptId) -> ConsultResult<usize> {
        position_of(&self.orders, |o| &o.concept == concept, Self::CATEGORY, concept)
    }
}

impl CategoryStore for InvestigationStore {
    type Selection = InvestigationOrder;

    const CATEGORY: FactCategory = FactCategory::Investigation;

    fn selections(&self) -> &[InvestigationOrder] {
        &self.orders
    }

    fn reset(&mut self) {
        self.orders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConsultError;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    #[test]
    fn concept_is_unique_across_category_labels() {
        let mut store = InvestigationStore::default();
        store.add("Laboratory", None, id("cbc"), "Complete blood count").expect("lab");
        for label in ["Laboratory", "Haematology"] {
            assert!(matches!(
                store.add(label, None, id("cbc"), "Complete blood count"),
                Err(ConsultError::DuplicateSelection { category: FactCategory::Investigation, .. })
            ));
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.groups().len(), 1);
    }

    #[test]
    fn removed_concept_can_be_ordered_under_another_label() {
        let mut store = InvestigationStore::default();
        store.add("Laboratory", None, id("glucose"), "Blood glucose").expect("lab");
        let removed = store.remove(&id("glucose")).expect("remove");
        assert_eq!(removed.category.as_str(), "Laboratory");

        store.add("Point of care", None, id("glucose"), "Blood glucose").expect("poc");
        assert_eq!(store.selections()[0].category.as_str(), "Point of care");
        assert!(matches!(
            store.remove(&id("cbc")),
            Err(ConsultError::UnknownSelection { .. })
        ));
    }

    #[test]
    fn groups_keep_first_use_order() {
        let mut store = InvestigationStore::default();
        store.add("Radiology", Some(id("rad")), id("cxr"), "Chest X-ray").expect("cxr");
        store.add("Laboratory", None, id("cbc"), "Complete blood count").expect("cbc");
        store.add("Radiology", Some(id("rad")), id("usg"), "Ultrasound").expect("usg");

        let groups = store.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category.as_str(), "Radiology");
        assert_eq!(groups[0].category_concept, Some(&id("rad")));
        assert_eq!(groups[0].orders.len(), 2);
        assert_eq!(groups[1].category.as_str(), "Laboratory");
    }

    #[test]
    fn unset_priority_is_routine() {
        let mut store = InvestigationStore::default();
        store.add("Laboratory", None, id("cbc"), "Complete blood count").expect("cbc");
        assert_eq!(store.selections()[0].effective_priority(), RequestPriority::Routine);

        store.set_priority(&id("cbc"), OrderPriority::Stat).expect("stat");
        assert_eq!(store.selections()[0].effective_priority(), RequestPriority::Stat);
    }
}
