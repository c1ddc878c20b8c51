use crate::stores::FactCategory;
use consult_types::ConceptId;

#[derive(Debug, thiserror::Error)]
pub enum ConsultError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{category} '{concept}' is already selected")]
    DuplicateSelection {
        category: FactCategory,
        concept: ConceptId,
    },
    #[error("{category} '{concept}' is not selected")]
    UnknownSelection {
        category: FactCategory,
        concept: ConceptId,
    },

    #[error("invalid text: {0}")]
    Text(#[from] consult_types::TextError),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid consultation draft: {0}")]
    InvalidDraft(String),
    #[error("failed to read consultation draft: {0}")]
    DraftRead(std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server rejected the consultation ({status}): {message}")]
    Rejected { status: u16, message: String },
}

pub type ConsultResult<T> = std::result::Result<T, ConsultError>;
