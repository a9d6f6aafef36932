mod templates;

pub use templates::{detect_category, PromptTemplate};
