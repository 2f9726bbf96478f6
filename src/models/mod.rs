mod outcome;
mod post;
mod trend;

pub use outcome::GenerationOutcome;
pub use post::{BlogPost, CreatedBy, NewBlogPost, PostDraft, PostStatus};
pub use trend::{distinct_trends, TrendAnalysis, TrendKeyword, TrendRecord};
