pub mod denylist;
pub mod ordering;
pub mod placement;

pub use denylist::Denylist;
pub use ordering::{
    OrderedWord,
    VocabularyOrdering,
};
pub use placement::{
    placement_test,
    PlacementLevel,
};
