use fhir::{
    BundleEntry, CodeableConcept, DispenseRequest, DoseAndRate, Dosage, MedicationRequest, Period,
    Quantity, Reference, RequestIntent, RequestPriority, RequestStatus, Resource, Timing,
    TimingRepeat,
};

use super::{create_entry, MappingContext};
use crate::stores::MedicationSelection;

/// Maps medication orders to active medication requests.
///
/// The dispense quantity is the selection's precomputed total, carried through unchanged.
/// Orders without a dose or frequency cannot be expressed and are skipped.
pub fn map_medications(selections: &[MedicationSelection], ctx: &MappingContext) -> Vec<BundleEntry> {
    selections
        .iter()
        .filter_map(|med| {
            let (Some(dose), Some(frequency)) = (med.dose, med.frequency.as_ref()) else {
                tracing::debug!(drug = %med.drug, "skipping medication without dose or frequency");
                return None;
            };

            let repeat = match (frequency.immediate, med.duration) {
                (false, Some(duration)) => Some(TimingRepeat {
                    duration,
                    duration_unit: med.duration_unit.ucum().to_owned(),
                }),
                _ => None,
            };

            let dosage = Dosage {
                text: None,
                patient_instruction: med.instructions.clone(),
                timing: Timing {
                    code: Some(CodeableConcept::concept(
                        frequency.concept.as_str(),
                        Some(frequency.name.clone()),
                    )),
                    repeat,
                },
                as_needed_boolean: med.as_needed,
                route: med
                    .route
                    .as_ref()
                    .map(|r| CodeableConcept::concept(r.concept.as_str(), Some(r.name.clone()))),
                dose_and_rate: vec![DoseAndRate {
                    dose_quantity: Quantity::with_unit(dose, med.dose_unit.clone()),
                }],
            };

            let resource = MedicationRequest {
                status: RequestStatus::Active,
                intent: RequestIntent::Order,
                priority: if med.stat {
                    RequestPriority::Stat
                } else {
                    RequestPriority::Routine
                },
                medication_reference: Reference::resource("Medication", &med.drug)
                    .with_display(med.name.to_string()),
                subject: ctx.patient_ref(),
                encounter: ctx.encounter_ref(),
                authored_on: ctx.consultation_date,
                requester: ctx.recorder_ref(),
                dosage_instruction: vec![dosage],
                dispense_request: Some(DispenseRequest {
                    quantity: Quantity::with_unit(
                        med.total_quantity,
                        med.dispense_unit().map(str::to_owned),
                    ),
                    validity_period: med.start_date.map(|start| Period {
                        start: Some(start),
                        end: None,
                    }),
                }),
            };
            Some(create_entry(Resource::MedicationRequest(resource)))
        })
        .collect()
}
