//! Mesh consolidation: per-corner attributes to a flat, indexed vertex set

mod consolidate;
mod index;

pub use consolidate::{
    ConsolidatedMesh, FaceGroup, GeometryConsolidator, Pool, Slot, Triangle, VertexRecord,
};
pub use index::IndexType;
