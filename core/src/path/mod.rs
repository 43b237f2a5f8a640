//! Path Model

mod edge;
mod guard;
mod vertex;
mod walker;

pub use edge::*;
pub use guard::*;
pub use vertex::*;
pub use walker::*;

use crate::memory::*;

/// Direction in which quantities are transported along a sub-path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportMode {
    /// Importance flows from the sensor; used on the emitter sub-path.
    Importance = 0,

    /// Radiance flows from the emitters; used on the sensor sub-path.
    Radiance = 1,
}

impl TransportMode {
    /// Returns the index used for the per-mode arrays of vertices and edges.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the opposite transport mode.
    pub fn other(self) -> Self {
        match self {
            Self::Importance => Self::Radiance,
            Self::Radiance => Self::Importance,
        }
    }
}

/// Measure in which a vertex density is expressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Measure {
    /// Area (or volume) measure of the vertex position.
    Area,

    /// Solid angle measure of the direction that produced the vertex.
    SolidAngle,

    /// Discrete measure of a degenerate (Dirac) component.
    Discrete,
}

/// Ordered list of vertex and edge handles checked out from a `PathArena`.
///
/// Vertex 0 is the supernode and vertex 1 the endpoint sample. Edge `i` joins vertex `i` and `i + 1`.
#[derive(Clone, Debug, Default)]
pub struct Path {
    /// Vertices.
    vertices: Vec<VertexId>,

    /// Edges.
    edges: Vec<EdgeId>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty path with room for a number of vertices.
    ///
    /// * `capacity` - Expected vertex count.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            edges: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of vertices that are not the supernode.
    pub fn length(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Returns the vertex handle at an index.
    ///
    /// * `i` - Vertex index.
    #[inline]
    pub fn vertex(&self, i: usize) -> VertexId {
        self.vertices[i]
    }

    /// Returns the vertex handle at a signed index or `None` when it lies outside the path.
    ///
    /// * `i` - Vertex index.
    #[inline]
    pub fn vertex_or_none(&self, i: isize) -> Option<VertexId> {
        usize::try_from(i).ok().and_then(|i| self.vertices.get(i).copied())
    }

    /// Returns the edge handle at an index.
    ///
    /// * `i` - Edge index.
    #[inline]
    pub fn edge(&self, i: usize) -> EdgeId {
        self.edges[i]
    }

    /// Returns the edge handle at a signed index or `None` when it lies outside the path.
    ///
    /// * `i` - Edge index.
    #[inline]
    pub fn edge_or_none(&self, i: isize) -> Option<EdgeId> {
        usize::try_from(i).ok().and_then(|i| self.edges.get(i).copied())
    }

    /// Appends the first vertex of the path.
    ///
    /// * `v` - Vertex handle.
    pub fn push_root(&mut self, v: VertexId) {
        assert!(self.vertices.is_empty(), "path already has a root vertex");
        self.vertices.push(v);
    }

    /// Appends an edge and the vertex it leads to.
    ///
    /// * `e` - Edge handle.
    /// * `v` - Vertex handle.
    pub fn append(&mut self, e: EdgeId, v: VertexId) {
        assert!(!self.vertices.is_empty(), "path has no root vertex");
        self.edges.push(e);
        self.vertices.push(v);
    }

    /// Returns every handle to the arena and leaves the path empty.
    ///
    /// * `arena` - The arena the handles were checked out from.
    pub fn release(&mut self, arena: &mut PathArena) {
        for v in self.vertices.drain(..) {
            arena.release_vertex(v);
        }
        for e in self.edges.drain(..) {
            arena.release_edge(e);
        }
    }
}
