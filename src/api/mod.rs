//! Declarative API model: resource templates, link templates and relations,
//! plus the builder, definition-file loader and auto-linker that produce them.

mod autolink;
mod build;
mod load;
mod types;

pub use autolink::*;
pub use build::*;
pub use load::*;
pub use types::*;
