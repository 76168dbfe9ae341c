use super::cancel::CancelSignal;
use crate::domain::reference::{GroupMembers, GroupReference, ResolvedGroup};
use crate::error::{CatalogError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

/// Resolution outcome for every requested reference.
pub type ResolvedMap = HashMap<GroupReference, ResolvedGroup>;

/// Effective worker count: never zero, never more than there is work for.
pub fn effective_limit(limit: usize, pending: usize) -> usize {
    limit.min(pending).max(1)
}

/// Resolves every reference through `resolve`, with at most `limit` calls in
/// flight.
///
/// Each outcome is recorded on its own: a failed reference never stops its
/// siblings, and the returned map always holds one entry per input reference.
/// Once `cancel` fires, in-flight and not-yet-started calls are recorded as
/// [`CatalogError::Cancelled`]; entries that already completed are kept.
pub async fn fan_out<F, Fut>(
    references: Vec<GroupReference>,
    limit: usize,
    cancel: &CancelSignal,
    resolve: F,
) -> ResolvedMap
where
    F: Fn(GroupReference) -> Fut,
    Fut: Future<Output = Result<GroupMembers>>,
{
    let workers = effective_limit(limit, references.len());
    debug!(references = references.len(), workers, "resolving group references");

    stream::iter(references)
        .map(|reference| {
            let call = resolve(reference.clone());
            async move {
                if cancel.is_cancelled() {
                    return (reference, Err(CatalogError::Cancelled));
                }
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(CatalogError::Cancelled),
                    result = call => result,
                };
                (reference, outcome)
            }
        })
        .buffer_unordered(workers)
        .map(|(reference, outcome)| {
            let resolved = match outcome {
                Ok(members) => ResolvedGroup::resolved(members),
                Err(e) => {
                    warn!(
                        kind = ?reference.kind,
                        seller_number = %reference.seller_number,
                        group_id = reference.group_id,
                        error = %e,
                        "group resolution failed"
                    );
                    ResolvedGroup::failed(reference.clone(), e)
                }
            };
            (reference, resolved)
        })
        .collect::<ResolvedMap>()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cancel::cancel_pair;
    use crate::domain::allocation::Terminal;
    use crate::domain::reference::GroupKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn terminal_ref(id: i64) -> GroupReference {
        GroupReference::new(GroupKind::Terminal, "100", id)
    }

    fn members(id: i64) -> GroupMembers {
        GroupMembers::Terminals(vec![Terminal {
            id,
            ..Default::default()
        }])
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(16, 3), 3);
        assert_eq!(effective_limit(2, 10), 2);
        assert_eq!(effective_limit(0, 10), 1);
        assert_eq!(effective_limit(16, 0), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_siblings() {
        let refs = vec![terminal_ref(1), terminal_ref(2), terminal_ref(3)];
        let resolved = fan_out(refs, 4, &CancelSignal::never(), |r| async move {
            if r.group_id == 2 {
                Err(CatalogError::Status {
                    status: 500,
                    url: "groups/2".to_string(),
                })
            } else {
                Ok(members(r.group_id))
            }
        })
        .await;

        assert_eq!(resolved.len(), 3);
        assert!(resolved[&terminal_ref(1)].is_resolved());
        assert!(resolved[&terminal_ref(3)].is_resolved());
        let failed = &resolved[&terminal_ref(2)];
        assert!(!failed.is_resolved());
        assert_eq!(failed.failure.as_ref().unwrap().reference, terminal_ref(2));
    }

    #[tokio::test]
    async fn test_in_flight_calls_respect_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let refs: Vec<_> = (0..20).map(terminal_ref).collect();

        let resolved = fan_out(refs, 3, &CancelSignal::never(), |r| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(members(r.group_id))
            }
        })
        .await;

        assert_eq!(resolved.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_entries() {
        let (handle, signal) = cancel_pair();
        let handle = Arc::new(handle);
        let refs = vec![terminal_ref(1), terminal_ref(2), terminal_ref(3)];

        let resolved = fan_out(refs, 1, &signal, |r| {
            let handle = handle.clone();
            async move {
                if r.group_id == 1 {
                    // First call completes, then pulls the plug on the rest.
                    handle.cancel();
                    return Ok(members(1));
                }
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(members(r.group_id))
            }
        })
        .await;

        assert_eq!(resolved.len(), 3);
        assert!(resolved[&terminal_ref(1)].is_resolved());
        for id in [2, 3] {
            let entry = &resolved[&terminal_ref(id)];
            assert!(matches!(
                entry.failure.as_ref().map(|f| &f.cause),
                Some(CatalogError::Cancelled)
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_map() {
        let calls = AtomicUsize::new(0);
        let resolved = fan_out(Vec::new(), 8, &CancelSignal::never(), |r| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(members(r.group_id)) }
        })
        .await;
        assert!(resolved.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
