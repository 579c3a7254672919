mod diagnostic;
mod metadata;

pub use diagnostic::{Diagnostic, DiagnosticSeverity, SourceRange};
pub use metadata::{
    Annotated, Attribute, Class, Enum, EnumConstant, ExtractionContext, FieldKind, Property,
    SourceLocation, qualified_name,
};
