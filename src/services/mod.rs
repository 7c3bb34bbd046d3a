//! External collaborators

pub mod reference_data;

pub use reference_data::{
    parse_audience_table, AudienceTable, FileReferenceDataProvider, HttpReferenceDataProvider,
    ReferenceData, ReferenceDataBundle, ReferenceDataError, ReferenceDataProvider,
};
