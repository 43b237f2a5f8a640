//! Measure Guard

use super::Measure;
use crate::memory::*;
use std::ops::{Deref, DerefMut};

/// Forces the measure of up to two vertices to `Measure::Area` and restores the original measures when dropped.
///
/// The guard borrows the arena mutably and dereferences to it, so the connection code keeps working through the guard
/// and the measures come back on every exit path.
pub struct MeasureGuard<'a> {
    /// The arena holding the vertices.
    arena: &'a mut PathArena,

    /// Vertices and the measures they had before.
    saved: [Option<(VertexId, Measure)>; 2],
}

impl<'a> MeasureGuard<'a> {
    /// Switch vertices to area measure.
    ///
    /// * `arena` - The arena holding the vertices.
    /// * `ids`   - Vertices to switch. `None` entries are skipped.
    pub fn new(arena: &'a mut PathArena, ids: [Option<VertexId>; 2]) -> Self {
        let mut saved = [None; 2];
        for (slot, id) in saved.iter_mut().zip(ids) {
            if let Some(id) = id {
                let v = arena.vertex_mut(id);
                *slot = Some((id, v.measure));
                v.measure = Measure::Area;
            }
        }

        // A vertex listed twice keeps the measure saved first.
        if let [Some((a, _)), Some((b, _))] = saved {
            if a == b {
                saved[1] = None;
            }
        }

        Self { arena, saved }
    }
}

impl Deref for MeasureGuard<'_> {
    type Target = PathArena;

    fn deref(&self) -> &PathArena {
        self.arena
    }
}

impl DerefMut for MeasureGuard<'_> {
    fn deref_mut(&mut self) -> &mut PathArena {
        self.arena
    }
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        for (id, measure) in self.saved.iter().flatten() {
            self.arena.vertex_mut(*id).measure = *measure;
        }
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::*;
    use crate::path::*;

    #[test]
    fn measures_restored_on_drop() {
        let mut arena = PathArena::new();
        let mut v = PathVertex::new(VertexKind::Medium, Point3f::default());
        v.measure = Measure::SolidAngle;
        let a = arena.alloc_vertex(v);
        v.measure = Measure::Discrete;
        let b = arena.alloc_vertex(v);

        {
            let guard = MeasureGuard::new(&mut arena, [Some(a), Some(b)]);
            assert_eq!(guard.vertex(a).measure, Measure::Area);
            assert_eq!(guard.vertex(b).measure, Measure::Area);
        }

        assert_eq!(arena.vertex(a).measure, Measure::SolidAngle);
        assert_eq!(arena.vertex(b).measure, Measure::Discrete);
    }

    #[test]
    fn same_vertex_twice() {
        let mut arena = PathArena::new();
        let mut v = PathVertex::new(VertexKind::Medium, Point3f::default());
        v.measure = Measure::SolidAngle;
        let a = arena.alloc_vertex(v);

        drop(MeasureGuard::new(&mut arena, [Some(a), Some(a)]));
        assert_eq!(arena.vertex(a).measure, Measure::SolidAngle);

        drop(MeasureGuard::new(&mut arena, [None, Some(a)]));
        assert_eq!(arena.vertex(a).measure, Measure::SolidAngle);
    }
}
