//! Shared data models spanning the engine layers.

pub mod feedback;
pub mod inventory;
pub mod lenient;
pub mod persona;
pub mod weights;

pub use feedback::{
    AudienceSelection, DimensionalFeedback, FeedbackRecord, FormatSelection, LineItem, PlanData,
    PlanEdits, RatingDimension,
};
pub use inventory::{
    AdFormat, FormatCatalogue, FormatInventoryRecord, FormatType, InventoryTable,
    LanguageInventory, Site,
};
pub use persona::{
    DemographicFilter, Generation, GeographyFilter, IncomeGroup, Persona, PersonaCategory, Race,
};
pub use weights::{EntityScore, LearningWeights, RankedKey, VerticalStats};

/// Canonical lookup key: trimmed, lower-cased, inner whitespace collapsed.
///
/// Persona, platform, format and vertical keys in the weights document and the
/// inventory table are all stored in this form.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
