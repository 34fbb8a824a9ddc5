//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;

/// Imported symbols per edge (usually a handful).
pub type SymbolList = SmallVec<[String; 4]>;

