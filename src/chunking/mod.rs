mod accumulator;
mod context;
mod heading;
mod identity;
mod layout;
mod processor;
mod record;
#[cfg(test)]
mod tests;

pub use heading::HeadingClassifier;
#[cfg(test)]
pub use heading::{HeadingLevel, LineClass};
pub use identity::{IdentityResolver, StandardIdentity, UNKNOWN};
pub use processor::{DocumentProcessor, LayoutOptions, ProcessedDocument};
pub use record::{Chunk, VectorRecord, chunk_record_id, document_stem, vector_records};
