//! Path Arena

use crate::path::*;

/// Handle of a vertex checked out from a `PathArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(u32);

/// Handle of an edge checked out from a `PathArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(u32);

/// Reusable pool of path vertices and edges.
///
/// Records live in flat vectors and are handed out as indices. Released slots go on a free list and are reset when
/// they are checked out again, so a worker can reuse one arena for every sample of a tile.
#[derive(Default)]
pub struct PathArena {
    /// Vertex storage.
    vertices: Vec<PathVertex>,

    /// Edge storage.
    edges: Vec<PathEdge>,

    /// Released vertex slots.
    free_vertices: Vec<u32>,

    /// Released edge slots.
    free_edges: Vec<u32>,

    /// Checkout state of every vertex slot, used to catch double releases.
    vertex_in_use: Vec<bool>,

    /// Checkout state of every edge slot.
    edge_in_use: Vec<bool>,
}

impl PathArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with preallocated slots.
    ///
    /// * `capacity` - Number of vertices and edges to reserve.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            edges: Vec::with_capacity(capacity),
            free_vertices: Vec::with_capacity(capacity),
            free_edges: Vec::with_capacity(capacity),
            vertex_in_use: Vec::with_capacity(capacity),
            edge_in_use: Vec::with_capacity(capacity),
        }
    }

    /// Checks out a vertex slot and initializes it.
    ///
    /// * `v` - Initial contents.
    pub fn alloc_vertex(&mut self, v: PathVertex) -> VertexId {
        match self.free_vertices.pop() {
            Some(i) => {
                self.vertices[i as usize] = v;
                self.vertex_in_use[i as usize] = true;
                VertexId(i)
            }
            None => {
                let i = self.vertices.len() as u32;
                self.vertices.push(v);
                self.vertex_in_use.push(true);
                VertexId(i)
            }
        }
    }

    /// Checks out an edge slot and initializes it.
    ///
    /// * `e` - Initial contents.
    pub fn alloc_edge(&mut self, e: PathEdge) -> EdgeId {
        match self.free_edges.pop() {
            Some(i) => {
                self.edges[i as usize] = e;
                self.edge_in_use[i as usize] = true;
                EdgeId(i)
            }
            None => {
                let i = self.edges.len() as u32;
                self.edges.push(e);
                self.edge_in_use.push(true);
                EdgeId(i)
            }
        }
    }

    /// Returns a vertex slot to the pool.
    ///
    /// * `id` - Vertex handle.
    pub fn release_vertex(&mut self, id: VertexId) {
        let i = id.0 as usize;
        assert!(self.vertex_in_use[i], "vertex {} released twice", id.0);
        self.vertex_in_use[i] = false;
        self.vertices[i] = PathVertex::default();
        self.free_vertices.push(id.0);
    }

    /// Returns an edge slot to the pool.
    ///
    /// * `id` - Edge handle.
    pub fn release_edge(&mut self, id: EdgeId) {
        let i = id.0 as usize;
        assert!(self.edge_in_use[i], "edge {} released twice", id.0);
        self.edge_in_use[i] = false;
        self.free_edges.push(id.0);
    }

    /// Returns a checked out vertex.
    ///
    /// * `id` - Vertex handle.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &PathVertex {
        &self.vertices[id.0 as usize]
    }

    /// Returns a checked out vertex for modification.
    ///
    /// * `id` - Vertex handle.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut PathVertex {
        &mut self.vertices[id.0 as usize]
    }

    /// Returns a checked out edge.
    ///
    /// * `id` - Edge handle.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &PathEdge {
        &self.edges[id.0 as usize]
    }

    /// Returns a checked out edge for modification.
    ///
    /// * `id` - Edge handle.
    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut PathEdge {
        &mut self.edges[id.0 as usize]
    }

    /// Returns the number of vertices and edges currently checked out.
    pub fn outstanding(&self) -> usize {
        (self.vertices.len() - self.free_vertices.len()) + (self.edges.len() - self.free_edges.len())
    }

    /// Returns the number of slots ever created.
    pub fn capacity(&self) -> usize {
        self.vertices.len() + self.edges.len()
    }

    /// Returns the memory held by the arena in bytes.
    pub fn memory_usage(&self) -> usize {
        self.vertices.capacity() * std::mem::size_of::<PathVertex>()
            + self.edges.capacity() * std::mem::size_of::<PathEdge>()
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::*;

    #[test]
    fn released_slots_are_reused() {
        let mut arena = PathArena::new();
        let a = arena.alloc_vertex(PathVertex::new(VertexKind::Medium, Point3f::new(1.0, 2.0, 3.0)));
        let b = arena.alloc_vertex(PathVertex::default());
        let e = arena.alloc_edge(PathEdge::default());
        assert_eq!(arena.outstanding(), 3);
        assert_eq!(arena.vertex(a).p, Point3f::new(1.0, 2.0, 3.0));

        arena.release_vertex(a);
        arena.release_edge(e);
        assert_eq!(arena.outstanding(), 1);

        let c = arena.alloc_vertex(PathVertex::new(VertexKind::Surface, Point3f::default()));
        assert_eq!(c, a);
        assert_eq!(arena.vertex(c).kind, VertexKind::Surface);
        assert_eq!(arena.capacity(), 3);

        arena.release_vertex(b);
        arena.release_vertex(c);
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    #[should_panic]
    fn double_release_panics() {
        let mut arena = PathArena::new();
        let a = arena.alloc_vertex(PathVertex::default());
        arena.release_vertex(a);
        arena.release_vertex(a);
    }

    #[test]
    fn path_release_returns_everything() {
        let mut arena = PathArena::with_capacity(8);
        let mut path = Path::new();
        path.push_root(arena.alloc_vertex(PathVertex::new(VertexKind::EmitterSupernode, Point3f::default())));
        for i in 0..3 {
            let e = arena.alloc_edge(PathEdge::default());
            let v = arena.alloc_vertex(PathVertex::new(VertexKind::Medium, Point3f::new(i as f32, 0.0, 0.0)));
            path.append(e, v);
        }
        assert_eq!(path.vertex_count(), 4);
        assert_eq!(path.edge_count(), 3);
        assert_eq!(path.length(), 3);
        assert_eq!(path.vertex_or_none(-1), None);
        assert_eq!(path.vertex_or_none(4), None);
        assert_eq!(arena.outstanding(), 7);

        path.release(&mut arena);
        assert_eq!(path.vertex_count(), 0);
        assert_eq!(arena.outstanding(), 0);
    }
}
