pub mod content_type;
pub mod shape;
pub mod state;

pub use content_type::ContentType;
pub use shape::{FieldDef, JsonType, ShapeDef, ShapeKind};
pub use state::{
    BatchRecord, BodyDescriptor, PathComponent, RequestDef, ResponseDef, SpecState, ROOT_PATH_ID,
};
