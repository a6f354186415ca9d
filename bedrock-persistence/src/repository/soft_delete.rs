//! The cascading soft-delete engine
//!
//! Soft-deleting an aggregate root must never leave orphaned-but-live
//! children, and must never touch entities reachable only through
//! restrict/no-action relationships. The engine walks the relationship graph
//! of an [`EntityNode`], stamping `deleted_at` on every reachable,
//! not-yet-deleted entity whose relationship propagates the mark, and
//! accumulates every store-resolved descendant so the caller can persist the
//! whole graph in one step.
//!
//! Nothing is persisted here: the mutations stay in memory until the
//! repository hands root and descendants to the store's `save_graph`, which
//! is the single durability point.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{PersistenceError, Result};

use super::relations::{
    AsyncRelationResolver, EntityNode, RelationResolver, RelationValue,
};

/// The in-memory result of a cascade walk
pub struct CascadeOutcome {
    /// Store-resolved descendants that were stamped; persisted with the root
    pub resolved: Vec<Box<dyn EntityNode>>,
    /// Number of entities stamped in this walk, the root included
    pub marked: usize,
}

impl fmt::Debug for CascadeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeOutcome")
            .field("marked", &self.marked)
            .field("resolved", &self.resolved.len())
            .finish()
    }
}

/// The one-to-one guard
///
/// Refuses the soft delete when the entity declares a foreign key that is a
/// true one-to-one link (neither navigation a collection) to another type:
/// the logically deleted but physically present dependent row would collide
/// with a later insert using the same foreign key. Self-referencing
/// one-to-one links are exempt.
pub fn check_one_to_one(root: &dyn EntityNode) -> Result<()> {
    let conflicted = root
        .foreign_keys()
        .iter()
        .any(|fk| fk.is_one_to_one() && fk.principal_type != root.entity_type());
    if conflicted {
        warn!(
            entity_type = root.entity_type(),
            entity_key = %root.entity_key(),
            "refusing soft delete: entity participates in a one-to-one relationship"
        );
        return Err(PersistenceError::one_to_one_conflict(root.entity_type()));
    }
    Ok(())
}

/// Walk the relationship graph and stamp `deleted_at` (blocking)
///
/// The guard runs before any mutation; on failure every timestamp is left
/// untouched. Already-deleted entities stop the walk, which both makes the
/// operation idempotent and terminates cyclic graphs; a visited set keyed by
/// `(type, key)` covers cycles that pass through store-resolved rows, whose
/// fresh instances do not yet carry the in-memory mark.
pub fn cascade_soft_delete(
    root: &mut dyn EntityNode,
    resolver: &dyn RelationResolver,
    now: DateTime<Utc>,
) -> Result<CascadeOutcome> {
    check_one_to_one(root)?;
    let mut outcome = CascadeOutcome {
        resolved: Vec::new(),
        marked: 0,
    };
    let mut visited = HashSet::new();
    mark(root, resolver, now, &mut visited, &mut outcome)?;
    Ok(outcome)
}

fn mark(
    node: &mut dyn EntityNode,
    resolver: &dyn RelationResolver,
    now: DateTime<Utc>,
    visited: &mut HashSet<(&'static str, String)>,
    outcome: &mut CascadeOutcome,
) -> Result<()> {
    if node.deleted_at().is_some() {
        return Ok(());
    }
    if !visited.insert((node.entity_type(), node.entity_key())) {
        return Ok(());
    }

    node.mark_deleted(now);
    outcome.marked += 1;
    debug!(
        entity_type = node.entity_type(),
        entity_key = %node.entity_key(),
        "soft delete mark"
    );

    for slot in node.relations() {
        if !slot.meta.propagates_soft_delete() {
            continue;
        }
        match slot.value {
            RelationValue::Loaded(children) => {
                for child in children {
                    mark(child, resolver, now, visited, outcome)?;
                }
            }
            RelationValue::Deferred(ref query) => {
                debug!(
                    relation = slot.meta.name,
                    target = query.target_type,
                    "resolving deferred relation"
                );
                let mut fetched = resolver.resolve(query)?;
                for child in &mut fetched {
                    mark(child.as_mut(), resolver, now, visited, outcome)?;
                }
                // A cycle can hand back a row already stamped through
                // another path; only stamped instances belong in the save.
                fetched.retain(|child| child.deleted_at().is_some());
                outcome.resolved.extend(fetched);
            }
        }
    }

    Ok(())
}

/// Walk the relationship graph and stamp `deleted_at` (suspending)
///
/// Behaviorally identical to [`cascade_soft_delete`]; related rows are
/// resolved without blocking a worker thread, and store round-trips occur in
/// the order the recursion implies.
pub async fn cascade_soft_delete_async<R: AsyncRelationResolver>(
    root: &mut dyn EntityNode,
    resolver: &R,
    now: DateTime<Utc>,
) -> Result<CascadeOutcome> {
    check_one_to_one(root)?;
    let mut outcome = CascadeOutcome {
        resolved: Vec::new(),
        marked: 0,
    };
    let mut visited = HashSet::new();
    mark_async(root, resolver, now, &mut visited, &mut outcome).await?;
    Ok(outcome)
}

fn mark_async<'a, R: AsyncRelationResolver>(
    node: &'a mut dyn EntityNode,
    resolver: &'a R,
    now: DateTime<Utc>,
    visited: &'a mut HashSet<(&'static str, String)>,
    outcome: &'a mut CascadeOutcome,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        if node.deleted_at().is_some() {
            return Ok(());
        }
        if !visited.insert((node.entity_type(), node.entity_key())) {
            return Ok(());
        }

        node.mark_deleted(now);
        outcome.marked += 1;
        debug!(
            entity_type = node.entity_type(),
            entity_key = %node.entity_key(),
            "soft delete mark"
        );

        for slot in node.relations() {
            if !slot.meta.propagates_soft_delete() {
                continue;
            }
            match slot.value {
                RelationValue::Loaded(children) => {
                    for child in children {
                        mark_async(child, resolver, now, visited, outcome).await?;
                    }
                }
                RelationValue::Deferred(ref query) => {
                    debug!(
                        relation = slot.meta.name,
                        target = query.target_type,
                        "resolving deferred relation"
                    );
                    let mut fetched = resolver.resolve(query).await?;
                    for child in &mut fetched {
                        mark_async(child.as_mut(), resolver, now, visited, outcome).await?;
                    }
                    fetched.retain(|child| child.deleted_at().is_some());
                    outcome.resolved.extend(fetched);
                }
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::StoreError;
    use crate::repository::relations::{
        DeleteBehavior, ForeignKeyMeta, RelationMeta, RelationQuery, RelationSlot,
    };

    /// A configurable graph node for exercising the engine
    #[derive(Clone)]
    struct Node {
        type_name: &'static str,
        key: u32,
        deleted_at: Option<DateTime<Utc>>,
        foreign_keys: Vec<ForeignKeyMeta>,
        loaded: Vec<(RelationMeta, Vec<Node>)>,
        deferred: Vec<(RelationMeta, RelationQuery)>,
    }

    impl Node {
        fn new(type_name: &'static str, key: u32) -> Self {
            Self {
                type_name,
                key,
                deleted_at: None,
                foreign_keys: Vec::new(),
                loaded: Vec::new(),
                deferred: Vec::new(),
            }
        }

        fn with_loaded(mut self, meta: RelationMeta, children: Vec<Node>) -> Self {
            self.loaded.push((meta, children));
            self
        }

        fn with_deferred(mut self, meta: RelationMeta, target: &'static str) -> Self {
            let query = RelationQuery {
                relation: meta.name,
                parent_type: self.type_name,
                parent_key: self.key.to_string(),
                target_type: target,
            };
            self.deferred.push((meta, query));
            self
        }

        fn with_foreign_key(mut self, fk: ForeignKeyMeta) -> Self {
            self.foreign_keys.push(fk);
            self
        }
    }

    impl EntityNode for Node {
        fn entity_type(&self) -> &'static str {
            self.type_name
        }

        fn entity_key(&self) -> String {
            self.key.to_string()
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }

        fn mark_deleted(&mut self, at: DateTime<Utc>) {
            self.deleted_at = Some(at);
        }

        fn foreign_keys(&self) -> Vec<ForeignKeyMeta> {
            self.foreign_keys.clone()
        }

        fn relations(&mut self) -> Vec<RelationSlot<'_>> {
            let mut slots = Vec::new();
            for (meta, children) in &mut self.loaded {
                slots.push(RelationSlot {
                    meta: meta.clone(),
                    value: RelationValue::Loaded(
                        children
                            .iter_mut()
                            .map(|child| child as &mut dyn EntityNode)
                            .collect(),
                    ),
                });
            }
            for (meta, query) in &self.deferred {
                slots.push(RelationSlot {
                    meta: meta.clone(),
                    value: RelationValue::Deferred(query.clone()),
                });
            }
            slots
        }
    }

    fn cascade_meta(name: &'static str) -> RelationMeta {
        RelationMeta {
            name,
            is_collection: true,
            is_on_dependent: false,
            delete_behavior: DeleteBehavior::Cascade,
            target_is_owned: false,
        }
    }

    fn restrict_meta(name: &'static str) -> RelationMeta {
        RelationMeta {
            delete_behavior: DeleteBehavior::Restrict,
            ..cascade_meta(name)
        }
    }

    /// Resolver serving canned rows per target type, recording call order
    #[derive(Default)]
    struct MapResolver {
        rows: Vec<(&'static str, Vec<Node>)>,
        calls: Mutex<Vec<String>>,
    }

    impl MapResolver {
        fn with_rows(mut self, target: &'static str, rows: Vec<Node>) -> Self {
            self.rows.push((target, rows));
            self
        }

        fn lookup(&self, query: &RelationQuery) -> Vec<Box<dyn EntityNode>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", query.relation, query.target_type));
            self.rows
                .iter()
                .filter(|(target, _)| *target == query.target_type)
                .flat_map(|(_, rows)| rows.iter().cloned())
                .filter(|row| row.deleted_at.is_none())
                .map(|row| Box::new(row) as Box<dyn EntityNode>)
                .collect()
        }
    }

    impl RelationResolver for MapResolver {
        fn resolve(
            &self,
            query: &RelationQuery,
        ) -> std::result::Result<Vec<Box<dyn EntityNode>>, StoreError> {
            Ok(self.lookup(query))
        }
    }

    impl AsyncRelationResolver for MapResolver {
        async fn resolve(
            &self,
            query: &RelationQuery,
        ) -> std::result::Result<Vec<Box<dyn EntityNode>>, StoreError> {
            Ok(self.lookup(query))
        }
    }

    #[test]
    fn test_marks_loaded_descendants_recursively() {
        let grandchild = Node::new("OrderLineNote", 30);
        let child = Node::new("OrderLine", 20)
            .with_loaded(cascade_meta("notes"), vec![grandchild]);
        let mut root = Node::new("Order", 10).with_loaded(cascade_meta("lines"), vec![child]);

        let outcome =
            cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert_eq!(outcome.marked, 3);
        assert!(root.deleted_at.is_some());
        assert!(root.loaded[0].1[0].deleted_at.is_some());
        assert!(root.loaded[0].1[0].loaded[0].1[0].deleted_at.is_some());
    }

    #[test]
    fn test_restrict_relations_left_untouched() {
        let kept = Node::new("AuditTrail", 40);
        let mut root = Node::new("Order", 10).with_loaded(restrict_meta("audit"), vec![kept]);

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert!(root.deleted_at.is_some());
        assert!(root.loaded[0].1[0].deleted_at.is_none());
    }

    #[test]
    fn test_dependent_side_relations_skipped() {
        let parent = Node::new("Customer", 50);
        let meta = RelationMeta {
            is_on_dependent: true,
            ..cascade_meta("customer")
        };
        let mut root = Node::new("Order", 10).with_loaded(meta, vec![parent]);

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert!(root.loaded[0].1[0].deleted_at.is_none());
    }

    #[test]
    fn test_owned_targets_skipped() {
        let address = Node::new("ShippingAddress", 60);
        let meta = RelationMeta {
            target_is_owned: true,
            is_collection: false,
            ..cascade_meta("shipping_address")
        };
        let mut root = Node::new("Order", 10).with_loaded(meta, vec![address]);

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert!(root.loaded[0].1[0].deleted_at.is_none());
    }

    #[test]
    fn test_already_deleted_is_noop() {
        let stamp = Utc::now() - chrono::Duration::days(1);
        let child = Node::new("OrderLine", 20);
        let mut root = Node::new("Order", 10).with_loaded(cascade_meta("lines"), vec![child]);
        root.deleted_at = Some(stamp);

        let outcome =
            cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert_eq!(outcome.marked, 0);
        assert_eq!(root.deleted_at, Some(stamp));
        assert!(root.loaded[0].1[0].deleted_at.is_none());
    }

    #[test]
    fn test_double_delete_idempotent() {
        let mut root = Node::new("Order", 10)
            .with_loaded(cascade_meta("lines"), vec![Node::new("OrderLine", 20)]);

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();
        let first = root.clone();
        let outcome =
            cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();

        assert_eq!(outcome.marked, 0);
        assert_eq!(root.deleted_at, first.deleted_at);
        assert_eq!(root.loaded[0].1[0].deleted_at, first.loaded[0].1[0].deleted_at);
    }

    #[test]
    fn test_one_to_one_guard_blocks_and_leaves_state() {
        let child = Node::new("Attachment", 70);
        let mut root = Node::new("UserProfile", 10)
            .with_loaded(cascade_meta("attachments"), vec![child])
            .with_foreign_key(ForeignKeyMeta {
                declaring_type: "UserProfile",
                principal_type: "User",
                dependent_is_collection: false,
                principal_is_collection: false,
            });

        let err =
            cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            PersistenceError::OneToOneSoftDeleteConflict { ref entity_type }
                if entity_type == "UserProfile"
        ));
        assert!(root.deleted_at.is_none());
        assert!(root.loaded[0].1[0].deleted_at.is_none());
    }

    #[test]
    fn test_self_referencing_one_to_one_allowed() {
        let mut root = Node::new("Employee", 10).with_foreign_key(ForeignKeyMeta {
            declaring_type: "Employee",
            principal_type: "Employee",
            dependent_is_collection: false,
            principal_is_collection: false,
        });

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();
        assert!(root.deleted_at.is_some());
    }

    #[test]
    fn test_one_to_many_foreign_key_allowed() {
        let mut root = Node::new("OrderLine", 10).with_foreign_key(ForeignKeyMeta {
            declaring_type: "OrderLine",
            principal_type: "Order",
            dependent_is_collection: false,
            principal_is_collection: true,
        });

        cascade_soft_delete(&mut root, &MapResolver::default(), Utc::now()).unwrap();
        assert!(root.deleted_at.is_some());
    }

    #[test]
    fn test_deferred_relations_resolved_and_collected() {
        let resolver = MapResolver::default().with_rows(
            "Shipment",
            vec![Node::new("Shipment", 80), Node::new("Shipment", 81)],
        );
        let mut root =
            Node::new("Order", 10).with_deferred(cascade_meta("shipments"), "Shipment");

        let outcome = cascade_soft_delete(&mut root, &resolver, Utc::now()).unwrap();

        assert_eq!(outcome.marked, 3);
        assert_eq!(outcome.resolved.len(), 2);
        assert!(outcome.resolved.iter().all(|n| n.deleted_at().is_some()));
    }

    #[test]
    fn test_resolution_order_follows_recursion() {
        let shipment = Node::new("Shipment", 80)
            .with_deferred(cascade_meta("parcels"), "Parcel");
        let resolver = MapResolver::default()
            .with_rows("Shipment", vec![shipment])
            .with_rows("Parcel", vec![Node::new("Parcel", 90)]);
        let mut root =
            Node::new("Order", 10).with_deferred(cascade_meta("shipments"), "Shipment");

        let outcome = cascade_soft_delete(&mut root, &resolver, Utc::now()).unwrap();

        assert_eq!(outcome.marked, 3);
        assert_eq!(
            *resolver.calls.lock().unwrap(),
            vec!["shipments:Shipment".to_string(), "parcels:Parcel".to_string()]
        );
    }

    #[test]
    fn test_cyclic_graph_terminates() {
        // Order defers to Shipment; Shipment defers back to Order with the
        // same key as the root. The visited set stops the second visit and
        // the stale duplicate is not collected for save.
        let shipment = Node::new("Shipment", 80)
            .with_deferred(cascade_meta("order"), "Order");
        let resolver = MapResolver::default()
            .with_rows("Shipment", vec![shipment])
            .with_rows("Order", vec![Node::new("Order", 10)]);
        let mut root =
            Node::new("Order", 10).with_deferred(cascade_meta("shipments"), "Shipment");

        let outcome = cascade_soft_delete(&mut root, &resolver, Utc::now()).unwrap();

        assert_eq!(outcome.marked, 2);
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].entity_type(), "Shipment");
    }

    #[tokio::test]
    async fn test_async_cascade_matches_sync() {
        let build = || {
            Node::new("Order", 10)
                .with_loaded(cascade_meta("lines"), vec![Node::new("OrderLine", 20)])
                .with_deferred(cascade_meta("shipments"), "Shipment")
        };
        let resolver = MapResolver::default().with_rows("Shipment", vec![Node::new("Shipment", 80)]);

        let mut sync_root = build();
        let now = Utc::now();
        let sync_outcome = cascade_soft_delete(&mut sync_root, &resolver, now).unwrap();

        let mut async_root = build();
        let async_outcome = cascade_soft_delete_async(&mut async_root, &resolver, now)
            .await
            .unwrap();

        assert_eq!(sync_outcome.marked, async_outcome.marked);
        assert_eq!(sync_outcome.resolved.len(), async_outcome.resolved.len());
        assert_eq!(sync_root.deleted_at, async_root.deleted_at);
        assert_eq!(
            sync_root.loaded[0].1[0].deleted_at,
            async_root.loaded[0].1[0].deleted_at
        );
    }

    #[test]
    fn test_outcome_debug_reports_counts() {
        let resolver = MapResolver::default().with_rows("Shipment", vec![Node::new("Shipment", 80)]);
        let mut root =
            Node::new("Order", 10).with_deferred(cascade_meta("shipments"), "Shipment");

        let outcome = cascade_soft_delete(&mut root, &resolver, Utc::now()).unwrap();
        let rendered = format!("{outcome:?}");
        assert!(rendered.contains("marked: 2"));
        assert!(rendered.contains("resolved: 1"));
    }

    #[tokio::test]
    async fn test_async_one_to_one_guard() {
        let mut root = Node::new("UserProfile", 10).with_foreign_key(ForeignKeyMeta {
            declaring_type: "UserProfile",
            principal_type: "User",
            dependent_is_collection: false,
            principal_is_collection: false,
        });

        let err = cascade_soft_delete_async(&mut root, &MapResolver::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::OneToOneSoftDeleteConflict { .. }
        ));
        assert!(root.deleted_at.is_none());
    }
}
