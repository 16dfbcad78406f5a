pub mod classification;
pub mod encoding;

pub use classification::{accuracy, classification_metrics, confusion_matrix, ClassificationMetrics};
pub use encoding::one_hot;
