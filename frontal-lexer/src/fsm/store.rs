use super::{StateId, TransitionId};

/// Arena of vertices and labeled edges addressed by stable integer ids.
///
/// Ids are never reused: removing a vertex or edge leaves an empty slot behind, so iteration
/// over the remaining items follows insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Store<V, E> {
    vertices: Vec<Option<Vertex<V>>>,
    edges: Vec<Option<Edge<E>>>,
    vertex_count: usize,
    edge_count: usize,
}

#[derive(Debug, Clone)]
struct Vertex<V> {
    data: V,
    /// Outgoing edges in the order they were added.
    outgoing: Vec<TransitionId>,
    incoming: Vec<TransitionId>,
}

/// Directed edge between two vertices of a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge<E> {
    pub(crate) from: StateId,
    pub(crate) to: StateId,
    pub(crate) label: E,
}

impl<V, E> Default for Store<V, E> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_count: 0,
            edge_count: 0,
        }
    }
}

impl<V, E> Store<V, E> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the id the next added vertex will receive.
    pub(crate) fn next_vertex_id(&self) -> StateId {
        self.vertices.len()
    }

    pub(crate) fn add_vertex(&mut self, data: V) -> StateId {
        let id = self.next_vertex_id();
        self.vertices.push(Some(Vertex {
            data,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }));
        self.vertex_count += 1;
        id
    }

    /// Adds an edge between two existing vertices. Returns `None` when either end point does
    /// not exist.
    pub(crate) fn add_edge(&mut self, from: StateId, to: StateId, label: E) -> Option<TransitionId> {
        if !self.contains_vertex(from) || !self.contains_vertex(to) {
            return None;
        }

        let id = self.edges.len();
        self.edges.push(Some(Edge { from, to, label }));
        self.edge_count += 1;

        self.slot_mut(from)?.outgoing.push(id);
        self.slot_mut(to)?.incoming.push(id);
        Some(id)
    }

    /// Removes a vertex together with every edge incident to it.
    pub(crate) fn remove_vertex(&mut self, id: StateId) -> Option<V> {
        let vertex = self.vertices.get_mut(id)?.take()?;
        self.vertex_count -= 1;

        for edge in vertex.outgoing.iter().chain(vertex.incoming.iter()) {
            self.remove_edge(*edge);
        }

        Some(vertex.data)
    }

    pub(crate) fn remove_edge(&mut self, id: TransitionId) -> Option<E> {
        let edge = self.edges.get_mut(id)?.take()?;
        self.edge_count -= 1;

        if let Some(from) = self.slot_mut(edge.from) {
            from.outgoing.retain(|e| *e != id);
        }
        if let Some(to) = self.slot_mut(edge.to) {
            to.incoming.retain(|e| *e != id);
        }

        Some(edge.label)
    }

    pub(crate) fn contains_vertex(&self, id: StateId) -> bool {
        matches!(self.vertices.get(id), Some(Some(_)))
    }

    pub(crate) fn vertex(&self, id: StateId) -> Option<&V> {
        self.vertices.get(id)?.as_ref().map(|v| &v.data)
    }

    pub(crate) fn vertex_mut(&mut self, id: StateId) -> Option<&mut V> {
        self.slot_mut(id).map(|v| &mut v.data)
    }

    pub(crate) fn edge(&self, id: TransitionId) -> Option<&Edge<E>> {
        self.edges.get(id)?.as_ref()
    }

    /// Iterates over the vertices in insertion order.
    pub(crate) fn vertices(&self) -> impl Iterator<Item = (StateId, &V)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(id, v)| v.as_ref().map(|v| (id, &v.data)))
    }

    /// Iterates over the edges in insertion order.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (TransitionId, &Edge<E>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(id, e)| e.as_ref().map(|e| (id, e)))
    }

    /// Iterates over the outgoing edges of a vertex in the order they were added. Yields
    /// nothing for an unknown vertex.
    pub(crate) fn outgoing(&self, id: StateId) -> impl Iterator<Item = (TransitionId, &Edge<E>)> + '_ {
        self.vertices
            .get(id)
            .and_then(Option::as_ref)
            .into_iter()
            .flat_map(|v| v.outgoing.iter())
            .filter_map(|e| self.edge(*e).map(|edge| (*e, edge)))
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn slot_mut(&mut self, id: StateId) -> Option<&mut Vertex<V>> {
        self.vertices.get_mut(id)?.as_mut()
    }
}
