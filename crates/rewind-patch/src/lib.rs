/// Structural patches over JSON-like values.
///
/// The diff side ([`produce_with_patches`]) realizes a mutation expressed
/// against a mutable draft as a new value plus matching forward and
/// inverse patch sequences; the apply side ([`apply_patches`]) replays
/// either sequence deterministically against a value.
pub mod apply;
pub mod diff;
pub mod error;
pub mod patch;

pub use apply::apply_patches;
pub use diff::produce_with_patches;
pub use error::PatchError;
pub use patch::{Patch, PathSegment};
