//! Extractor wrappers whose rejections speak the stable-code envelope.

mod enhanced_json;
mod enhanced_path;
mod enhanced_query;
mod validated_json;

pub use enhanced_json::Json;
pub use enhanced_path::Path;
pub use enhanced_query::Query;
pub use validated_json::ValidateJson;
