use fhir::{BundleEntry, CodeableConcept, RequestIntent, RequestStatus, Resource, ServiceRequest};

use super::{create_entry, MappingContext};
use crate::stores::InvestigationGroup;

/// Maps investigation orders, group by group, to active service request orders.
pub fn map_investigations(groups: &[InvestigationGroup<'_>], ctx: &MappingContext) -> Vec<BundleEntry> {
    groups
        .iter()
        .flat_map(|group| {
            let category = CodeableConcept::concept(
                group
                    .category_concept
                    .map(|c| c.as_str().to_owned())
                    .unwrap_or_else(|| group.category.to_string()),
                Some(group.category.to_string()),
            );
            group.orders.iter().map(move |order| {
                let resource = ServiceRequest {
                    status: RequestStatus::Active,
                    intent: RequestIntent::Order,
                    category: vec![category.clone()],
                    priority: order.effective_priority(),
                    code: CodeableConcept::concept(order.concept.as_str(), Some(order.name.to_string())),
                    subject: ctx.patient_ref(),
                    encounter: ctx.encounter_ref(),
                    authored_on: ctx.consultation_date,
                    requester: ctx.recorder_ref(),
                };
                create_entry(Resource::ServiceRequest(resource))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{context, id, TOKEN};
    use crate::stores::{InvestigationStore, OrderPriority};
    use fhir::RequestPriority;

    #[test]
    fn one_entry_per_order_per_group() {
        let mut store = InvestigationStore::default();
        store.add("Laboratory", Some(id("lab")), id("cbc"), "Complete blood count").expect("cbc");
        store.add("Radiology", None, id("cxr"), "Chest X-ray").expect("cxr");
        store.add("Laboratory", Some(id("lab")), id("lft"), "Liver function").expect("lft");
        store.set_priority(&id("cxr"), OrderPriority::Stat).expect("stat");

        let entries = map_investigations(&store.groups(), &context());
        assert_eq!(entries.len(), 3);

        let requests: Vec<&ServiceRequest> = entries
            .iter()
            .map(|e| match &e.resource {
                Resource::ServiceRequest(r) => r,
                other => panic!("unexpected {}", other.resource_type()),
            })
            .collect();

        assert_eq!(requests[0].code.first_code(), Some("cbc"));
        assert_eq!(requests[1].code.first_code(), Some("lft"));
        assert_eq!(requests[0].category[0].first_code(), Some("lab"));
        assert_eq!(requests[0].priority, RequestPriority::Routine);
        assert_eq!(requests[2].category[0].first_code(), Some("Radiology"));
        assert_eq!(requests[2].priority, RequestPriority::Stat);
        assert!(requests.iter().all(|r| r.encounter.as_str() == Some(TOKEN)));
    }
}
