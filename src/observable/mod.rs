//! Observable decorator over either tree variant.
//!
//! Every successful mutation fires the value-change listeners of the mutated
//! node and of each of its ancestors, nearest first, and relays a structured
//! event up the parent chain to the root, whose publisher emits it. Only a
//! root can be subscribed to.

pub mod event;
pub mod notifier;
pub mod publisher;

use std::collections::HashMap;

use crossbeam::channel::Receiver;
use tracing::{debug, instrument, trace};

use crate::domain::{
    IndexedTree, KeyedTree, Node, NodeId, PositionalMutation, Tree, TreeError, TreeMutation,
    TreeResult, TreeSettings,
};

pub use event::{NodeAddEvent, NodeEvent, NodeInsertEvent, NodeRemoveEvent};
pub use notifier::{ListenerId, ValueNotifier};
pub use publisher::EventPublisher;

pub type ObservableKeyedTree<T> = Observable<KeyedTree<T>>;
pub type ObservableIndexedTree<T> = Observable<IndexedTree<T>>;

/// Event publishers owned by a node; only a root's are ever fed.
#[derive(Debug)]
pub struct NodePublishers {
    added: EventPublisher<NodeAddEvent>,
    removed: EventPublisher<NodeRemoveEvent>,
    inserted: Option<EventPublisher<NodeInsertEvent>>,
}

impl NodePublishers {
    fn new(positional: bool) -> Self {
        Self {
            added: EventPublisher::new(),
            removed: EventPublisher::new(),
            inserted: positional.then(EventPublisher::new),
        }
    }

    fn close(&mut self) {
        self.added.close();
        self.removed.close();
        if let Some(inserted) = self.inserted.as_mut() {
            inserted.close();
        }
    }
}

/// Selects the publisher an event kind is emitted on.
trait Routed: NodeEvent {
    fn route(publishers: &mut NodePublishers) -> Option<&mut EventPublisher<Self>>;
}

impl Routed for NodeAddEvent {
    fn route(publishers: &mut NodePublishers) -> Option<&mut EventPublisher<Self>> {
        Some(&mut publishers.added)
    }
}

impl Routed for NodeRemoveEvent {
    fn route(publishers: &mut NodePublishers) -> Option<&mut EventPublisher<Self>> {
        Some(&mut publishers.removed)
    }
}

impl Routed for NodeInsertEvent {
    fn route(publishers: &mut NodePublishers) -> Option<&mut EventPublisher<Self>> {
        publishers.inserted.as_mut()
    }
}

/// Tree decorated with change notification and root-scoped events.
///
/// Listeners are plain `FnMut()` callbacks owned by the tree; they cannot
/// reach the tree while it is being mutated.
#[derive(Debug)]
pub struct Observable<Tr> {
    inner: Tr,
    notifiers: HashMap<NodeId, ValueNotifier>,
    publishers: HashMap<NodeId, NodePublishers>,
}

impl<Tr: Tree + Default> Default for Observable<Tr> {
    fn default() -> Self {
        Self::new(Tr::default())
    }
}

impl<T> Observable<KeyedTree<T>> {
    pub fn keyed(settings: TreeSettings) -> Self {
        Self::new(KeyedTree::with_settings(settings))
    }
}

impl<T> Observable<IndexedTree<T>> {
    pub fn indexed(settings: TreeSettings) -> Self {
        Self::new(IndexedTree::with_settings(settings))
    }
}

impl<Tr: Tree> Observable<Tr> {
    pub fn new(inner: Tr) -> Self {
        Self {
            inner,
            notifiers: HashMap::new(),
            publishers: HashMap::new(),
        }
    }

    pub fn inner(&self) -> &Tr {
        &self.inner
    }

    pub fn into_inner(self) -> Tr {
        self.inner
    }

    /// Registers a callback fired whenever `id` or any of its descendants changes.
    pub fn add_listener(
        &mut self,
        id: NodeId,
        listener: impl FnMut() + 'static,
    ) -> TreeResult<ListenerId> {
        self.inner.node(id)?;
        Ok(self.notifiers.entry(id).or_default().register(listener))
    }

    pub fn remove_listener(&mut self, id: NodeId, listener: ListenerId) -> TreeResult<bool> {
        self.inner.node(id)?;
        Ok(self
            .notifiers
            .get_mut(&id)
            .is_some_and(|n| n.unregister(listener)))
    }

    /// Stream of nodes added anywhere below the root `id`.
    pub fn added_nodes(&mut self, id: NodeId) -> TreeResult<Receiver<NodeAddEvent>> {
        Ok(self.root_publishers(id, "added nodes")?.added.subscribe())
    }

    /// Stream of nodes removed anywhere below the root `id`.
    pub fn removed_nodes(&mut self, id: NodeId) -> TreeResult<Receiver<NodeRemoveEvent>> {
        Ok(self.root_publishers(id, "removed nodes")?.removed.subscribe())
    }

    /// Stream of nodes inserted anywhere below the root `id`.
    ///
    /// Always fails on trees without positional insertion.
    pub fn inserted_nodes(&mut self, id: NodeId) -> TreeResult<Receiver<NodeInsertEvent>> {
        if !Tr::POSITIONAL {
            return Err(TreeError::not_allowed(
                self.inner.key(id)?,
                "inserted nodes are not available on a keyed tree",
            ));
        }
        Ok(self
            .root_publishers(id, "inserted nodes")?
            .inserted
            .get_or_insert_with(EventPublisher::new)
            .subscribe())
    }

    /// Closes the publishers of `id` and drops its listeners.
    #[instrument(level = "debug", skip(self))]
    pub fn dispose(&mut self, id: NodeId) -> TreeResult<()> {
        self.inner.node(id)?;
        if let Some(publishers) = self.publishers.get_mut(&id) {
            publishers.close();
        }
        if let Some(notifier) = self.notifiers.get_mut(&id) {
            notifier.clear();
        }
        Ok(())
    }

    fn root_publishers(&mut self, id: NodeId, stream: &str) -> TreeResult<&mut NodePublishers> {
        if !self.inner.is_root(id)? {
            return Err(TreeError::not_allowed(
                self.inner.key(id)?,
                format!("{} can only be subscribed to on the root node", stream),
            ));
        }
        Ok(self
            .publishers
            .entry(id)
            .or_insert_with(|| NodePublishers::new(Tr::POSITIONAL)))
    }

    /// Fires the listeners of `id` and of every ancestor, nearest first.
    fn notify_ancestors(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(notifier) = self.notifiers.get_mut(&node) {
                notifier.notify();
            }
            current = self.inner.get(node).and_then(|n| n.parent());
        }
    }

    /// Hands `event` from `origin` up the parent chain; the root emits it.
    fn relay<E: Routed>(&mut self, origin: NodeId, event: E) {
        if event.is_empty() {
            return;
        }
        let mut current = origin;
        while let Some(parent) = self.inner.get(current).and_then(|n| n.parent()) {
            current = parent;
        }
        trace!(?origin, root = ?current, "relaying event to root");
        match self.publishers.get_mut(&current).and_then(E::route) {
            Some(publisher) => publisher.emit(event),
            None => trace!(root = ?current, "root has no publisher for event"),
        }
    }

    fn changed<E: Routed>(&mut self, origin: NodeId, event: E) {
        self.notify_ancestors(origin);
        self.relay(origin, event);
    }

    fn added(&mut self, parent: NodeId, items: Vec<NodeId>) {
        self.changed(parent, NodeAddEvent { items });
    }

    fn removed(&mut self, parent: NodeId, items: Vec<NodeId>) {
        self.changed(parent, NodeRemoveEvent { items });
    }
}

impl<Tr: Tree> Tree for Observable<Tr> {
    type Data = Tr::Data;
    type Children = Tr::Children;
    const POSITIONAL: bool = Tr::POSITIONAL;

    fn settings(&self) -> &TreeSettings {
        self.inner.settings()
    }

    /// Creates the node together with its listeners and publishers.
    fn new_node(&mut self, key: impl Into<String>, data: Option<Tr::Data>) -> TreeResult<NodeId> {
        let id = self.inner.new_node(key, data)?;
        self.notifiers.insert(id, ValueNotifier::new());
        self.publishers.insert(id, NodePublishers::new(Tr::POSITIONAL));
        Ok(id)
    }

    fn get(&self, id: NodeId) -> Option<&Node<Tr::Data, Tr::Children>> {
        self.inner.get(id)
    }

    fn child_by_key(&self, id: NodeId, key: &str) -> TreeResult<Option<NodeId>> {
        self.inner.child_by_key(id, key)
    }

    /// Frees the subtree and disposes every node in it.
    #[instrument(level = "debug", skip(self))]
    fn free(&mut self, id: NodeId) -> TreeResult<usize> {
        let subtree: Vec<NodeId> = self.inner.descendants(id).collect();
        let freed = self.inner.free(id)?;
        for node in subtree {
            if let Some(mut publishers) = self.publishers.remove(&node) {
                publishers.close();
            }
            self.notifiers.remove(&node);
        }
        Ok(freed)
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }
}

impl<Tr: TreeMutation> TreeMutation for Observable<Tr> {
    fn add(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.inner.add(parent, child)?;
        self.added(parent, vec![child]);
        Ok(())
    }

    /// Children attached before a failure are still notified and emitted.
    fn add_all(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<()> {
        let mut added = Vec::with_capacity(children.len());
        for &child in children {
            if let Err(e) = self.inner.add(parent, child) {
                if !added.is_empty() {
                    self.added(parent, added);
                }
                return Err(e);
            }
            added.push(child);
        }
        self.added(parent, added);
        Ok(())
    }

    fn remove(&mut self, parent: NodeId, child: NodeId) -> TreeResult<Option<NodeId>> {
        let removed = self.inner.remove(parent, child)?;
        self.removed(parent, removed.into_iter().collect());
        Ok(removed)
    }

    /// Removals applied before a failure are still notified and emitted.
    fn remove_all(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<Vec<NodeId>> {
        let mut removed = Vec::with_capacity(children.len());
        for &child in children {
            match self.inner.remove(parent, child) {
                Ok(node) => removed.extend(node),
                Err(e) => {
                    if !removed.is_empty() {
                        self.removed(parent, removed);
                    }
                    return Err(e);
                }
            }
        }
        self.removed(parent, removed.clone());
        Ok(removed)
    }

    fn remove_where<P>(&mut self, parent: NodeId, predicate: P) -> TreeResult<Vec<NodeId>>
    where
        P: FnMut(&Node<Tr::Data, Tr::Children>) -> bool,
    {
        let removed = self.inner.remove_where(parent, predicate)?;
        self.removed(parent, removed.clone());
        Ok(removed)
    }

    fn clear(&mut self, parent: NodeId) -> TreeResult<Vec<NodeId>> {
        let removed = self.inner.clear(parent)?;
        self.removed(parent, removed.clone());
        Ok(removed)
    }

    /// Notification starts at the former parent, or at `id` itself for a root.
    fn delete(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let origin = self.inner.parent(id)?.unwrap_or(id);
        let removed = self.inner.delete(id)?;
        debug!(?id, ?origin, count = removed.len(), "deleted");
        self.removed(origin, removed.clone());
        Ok(removed)
    }
}

impl<Tr: PositionalMutation> PositionalMutation for Observable<Tr> {
    fn first(&self, id: NodeId) -> TreeResult<NodeId> {
        self.inner.first(id)
    }

    fn last(&self, id: NodeId) -> TreeResult<NodeId> {
        self.inner.last(id)
    }

    fn set_first(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId> {
        let previous = self.inner.set_first(id, node)?;
        self.notify_ancestors(id);
        self.relay(id, NodeRemoveEvent { items: vec![previous] });
        self.relay(id, NodeInsertEvent { items: vec![node], index: 0 });
        Ok(previous)
    }

    fn set_last(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId> {
        let previous = self.inner.set_last(id, node)?;
        let index = self.inner.child_count(id)? - 1;
        self.notify_ancestors(id);
        self.relay(id, NodeRemoveEvent { items: vec![previous] });
        self.relay(id, NodeInsertEvent { items: vec![node], index });
        Ok(previous)
    }

    fn child_at(&self, id: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
        self.inner.child_at(id, index)
    }

    fn index_where<P>(&self, id: NodeId, predicate: P, start: usize) -> TreeResult<Option<usize>>
    where
        P: FnMut(&Node<Tr::Data, Tr::Children>) -> bool,
    {
        self.inner.index_where(id, predicate, start)
    }

    fn first_where<P>(&self, id: NodeId, predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&Node<Tr::Data, Tr::Children>) -> bool,
    {
        self.inner.first_where(id, predicate)
    }

    fn last_where<P>(&self, id: NodeId, predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&Node<Tr::Data, Tr::Children>) -> bool,
    {
        self.inner.last_where(id, predicate)
    }

    fn insert(&mut self, id: NodeId, index: usize, node: NodeId) -> TreeResult<()> {
        self.inner.insert(id, index, node)?;
        self.changed(id, NodeInsertEvent { items: vec![node], index });
        Ok(())
    }

    /// Nodes inserted before a failure are still notified and emitted.
    fn insert_all(&mut self, id: NodeId, index: usize, nodes: &[NodeId]) -> TreeResult<()> {
        let mut inserted = Vec::with_capacity(nodes.len());
        for (offset, &node) in nodes.iter().enumerate() {
            if let Err(e) = self.inner.insert(id, index + offset, node) {
                if !inserted.is_empty() {
                    self.changed(id, NodeInsertEvent { items: inserted, index });
                }
                return Err(e);
            }
            inserted.push(node);
        }
        self.changed(id, NodeInsertEvent { items: inserted, index });
        Ok(())
    }

    fn insert_after(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize> {
        let index = self.inner.insert_after(id, anchor, node)?;
        self.changed(id, NodeInsertEvent { items: vec![node], index });
        Ok(index)
    }

    fn insert_before(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize> {
        let index = self.inner.insert_before(id, anchor, node)?;
        self.changed(id, NodeInsertEvent { items: vec![node], index });
        Ok(index)
    }

    fn remove_at(&mut self, id: NodeId, index: usize) -> TreeResult<NodeId> {
        let removed = self.inner.remove_at(id, index)?;
        self.removed(id, vec![removed]);
        Ok(removed)
    }
}
