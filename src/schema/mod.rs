//! Schema model, parsing, and content-model resolution

pub mod model;
pub mod parser;
pub mod resolver;

pub use model::{
    AttributeDefinition, ChildRef, ChildSlot, ContentModel, ElementDefinition, GroupDefinition,
    MaxOccurs, Occurs, SchemaModel,
};
pub use parser::SchemaParser;
pub use resolver::{Expansion, Resolver, SequenceSlot};
