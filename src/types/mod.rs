pub mod research;
pub mod tool;

pub use research::{
    CandidateNames, PageContent, RecommendationResult, ScrapedPage, SearchHit, validate_query,
};
pub use tool::{PricingModel, ToolRecord, TriState};
