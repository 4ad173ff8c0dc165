pub mod rules;
pub mod slots;
pub mod trait_;

pub use rules::RuleBasedClassifier;
pub use slots::extract_slots;
pub use trait_::{classify_with_timeout, ClassifyInput, Classifier};
