//! Tile data cache and fetch coordination.
//!
//! [`TileDataCoordinator`] tracks which tiles are resident, which are being
//! fetched and who is waiting for them. Each `request_tiles` call replaces
//! the caller's working set:
//!
//! ```text
//! requested ──► stale keys ──► evicted (resident, pending and waiters)
//!          ├──► resident   ──► nothing to do
//!          ├──► pending    ──► callback appended to the waiter list
//!          └──► untracked  ──► marked pending, one fetch issued
//!
//! fetch completion ──► key still pending? ──no──► discarded
//!                              │
//!                             yes ──► bins stored, waiters fired in order
//!                                     (no waiters fired for a gap)
//! ```
//!
//! At most one fetch is in flight per key. Eviction doesn't cancel a fetch;
//! it drops the key's waiters so the late answer is discarded.
//!
//! # Locking
//!
//! All state sits behind one mutex, held for each step of a call. The
//! transport and waiter callbacks run after the lock is released, so a
//! transport that completes synchronously or a callback that calls back into
//! the coordinator cannot deadlock.

mod state;
mod stats;

pub use stats::{CoordinatorStats, StatsSnapshot};

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bins::{transform_tile_to_bins, BinRecord};
use crate::coord::{TileCoord, TileKey};
use crate::payload::TilePayload;
use crate::pyramid::TilePyramid;
use crate::transport::{FetchContext, FetchRequest, TileTransport, TransportError};
use state::CacheState;

/// Callback fired with a tile's key once its data is resident.
pub type TileReadyCallback = Arc<dyn Fn(&TileKey) + Send + Sync>;

/// What one `request_tiles` call did, by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    /// Keys a fetch was issued for
    pub fetched: Vec<TileKey>,
    /// Keys already in flight; the callback joined their waiters
    pub coalesced: Vec<TileKey>,
    /// Keys whose data was already resident
    pub resident: Vec<TileKey>,
    /// Tracked keys not in the request, now released
    pub evicted: Vec<TileKey>,
}

impl RequestSummary {
    /// Number of distinct keys requested.
    pub fn requested(&self) -> usize {
        self.fetched.len() + self.coalesced.len() + self.resident.len()
    }
}

/// Outcome of delivering a payload to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Data stored and waiters notified
    Stored { bins: usize, callbacks: usize },
    /// No tile at this key; stored as empty, nobody notified
    Gap,
    /// Key was not pending; payload dropped
    Discarded,
}

/// Owns the tile cache and mediates every fetch.
pub struct TileDataCoordinator<T, P: ?Sized = dyn TilePyramid> {
    pyramid: Arc<P>,
    transport: Arc<dyn TileTransport<T>>,
    state: Mutex<CacheState<T>>,
    stats: CoordinatorStats,
    this: Weak<Self>,
}

impl<T, P> TileDataCoordinator<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: TilePyramid + ?Sized + 'static,
{
    /// Creates a coordinator with an empty cache.
    pub fn new(pyramid: Arc<P>, transport: Arc<dyn TileTransport<T>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            pyramid,
            transport,
            state: Mutex::new(CacheState::new()),
            stats: CoordinatorStats::new(),
            this: this.clone(),
        })
    }

    pub fn pyramid(&self) -> &Arc<P> {
        &self.pyramid
    }

    /// Makes `coords` the working set.
    ///
    /// Tracked keys outside the set are evicted first. Untracked keys are
    /// marked pending and fetched with `context`; keys already pending get
    /// `on_ready` appended to their waiters. Resident keys get no callback.
    /// Duplicate coordinates count once.
    pub fn request_tiles<I>(
        &self,
        coords: I,
        context: FetchContext,
        on_ready: TileReadyCallback,
    ) -> RequestSummary
    where
        I: IntoIterator<Item = TileCoord>,
    {
        let mut seen = HashSet::new();
        let requested: Vec<TileCoord> = coords
            .into_iter()
            .filter(|coord| seen.insert(coord.key()))
            .collect();

        let mut summary = RequestSummary::default();
        let mut to_fetch = Vec::new();
        {
            let mut state = self.state.lock();

            let mut stale: Vec<TileKey> = state
                .tracked_keys()
                .filter(|key| !seen.contains(*key))
                .copied()
                .collect();
            stale.sort();
            for key in &stale {
                state.release(key);
            }
            summary.evicted = stale;

            for coord in requested {
                let key = coord.key();
                if state.is_resident(&key) {
                    summary.resident.push(key);
                } else if state.add_waiter(&key, Arc::clone(&on_ready)) {
                    summary.coalesced.push(key);
                } else {
                    state.begin_fetch(key, Arc::clone(&on_ready));
                    summary.fetched.push(key);
                    to_fetch.push(coord);
                }
            }
        }

        self.stats.request();
        self.stats.evicted(summary.evicted.len());
        self.stats.coalesced(summary.coalesced.len());
        self.stats.fetches_issued(to_fetch.len());

        debug!(
            requested = summary.requested(),
            fetch = summary.fetched.len(),
            coalesced = summary.coalesced.len(),
            resident = summary.resident.len(),
            evicted = summary.evicted.len(),
            "Tile request"
        );

        for coord in to_fetch {
            self.issue_fetch(coord, context.clone());
        }

        summary
    }

    fn issue_fetch(&self, coord: TileCoord, context: FetchContext) {
        let requested = coord.key();
        let coordinator = self.this.clone();

        self.transport.fetch(
            FetchRequest::new(coord, context),
            Box::new(move |result: Result<TilePayload<T>, TransportError>| {
                // A dropped coordinator has nobody left to notify.
                let Some(coordinator) = coordinator.upgrade() else {
                    return;
                };
                match result {
                    Ok(payload) if payload.key() == requested => {
                        coordinator.on_fetch_complete(payload);
                    }
                    Ok(payload) => {
                        let error = TransportError::UnexpectedTile {
                            requested,
                            received: payload.key(),
                        };
                        coordinator.on_fetch_failed(requested, &error);
                    }
                    Err(error) => {
                        coordinator.on_fetch_failed(requested, &error);
                    }
                }
            }),
        );
    }

    /// Delivers a fetched payload.
    ///
    /// A payload for a key that is not pending is dropped with no side
    /// effects, so duplicate and late deliveries are harmless. Otherwise the
    /// tile's bins become resident and, if the tile has data, every waiter
    /// fires once in registration order.
    pub fn on_fetch_complete(&self, payload: TilePayload<T>) -> Completion {
        let key = payload.key();

        if !self.state.lock().is_pending(&key) {
            return self.discard(key);
        }

        let records = transform_tile_to_bins(self.pyramid.as_ref(), key, payload.tile());
        let bins = records.len();
        let is_gap = payload.is_gap();

        // Re-checked under the lock: the key may have been evicted while
        // the bins were built.
        let Some(waiters) = self.state.lock().complete(key, records) else {
            return self.discard(key);
        };

        if is_gap {
            self.stats.gap();
            debug!(tile = %key, dropped_waiters = waiters.len(), "Tile has no data");
            return Completion::Gap;
        }

        self.stats.stored();
        self.stats.callbacks_fired(waiters.len());
        debug!(tile = %key, bins, waiters = waiters.len(), "Tile resident");

        for waiter in &waiters {
            waiter(&key);
        }

        Completion::Stored {
            bins,
            callbacks: waiters.len(),
        }
    }

    fn discard(&self, key: TileKey) -> Completion {
        self.stats.discarded();
        debug!(tile = %key, "Discarding payload for untracked tile");
        Completion::Discarded
    }

    /// Reports a failed fetch.
    ///
    /// Clears the key's pending state and waiters without storing anything,
    /// so the next request for it fetches again. Returns false if the key was
    /// not pending.
    pub fn on_fetch_failed(&self, key: TileKey, error: &TransportError) -> bool {
        let dropped = self.state.lock().abandon(&key);
        match dropped {
            Some(waiters) => {
                self.stats.failure();
                warn!(tile = %key, waiters, error = %error, "Tile fetch failed");
                true
            }
            None => {
                debug!(tile = %key, error = %error, "Ignoring failure for untracked tile");
                false
            }
        }
    }

    /// Evicts a key from every map. Returns true if it was tracked.
    pub fn release_tile(&self, key: &TileKey) -> bool {
        let released = self.state.lock().release(key);
        if released {
            self.stats.evicted(1);
            debug!(tile = %key, "Released tile");
        }
        released
    }

    /// Every resident bin record.
    ///
    /// Tiles appear in key order; bins within a tile in row-major order.
    pub fn get_all_resident_bins(&self) -> Vec<BinRecord<T>> {
        let state = self.state.lock();
        let bins = state
            .resident_sorted()
            .into_iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect();
        bins
    }

    /// Bin records of one resident tile.
    pub fn resident_bins(&self, key: &TileKey) -> Option<Vec<BinRecord<T>>> {
        self.state.lock().resident(key).map(<[_]>::to_vec)
    }

    pub fn is_pending(&self, key: &TileKey) -> bool {
        self.state.lock().is_pending(key)
    }

    pub fn is_resident(&self, key: &TileKey) -> bool {
        self.state.lock().is_resident(key)
    }

    /// Number of callbacks waiting on a key.
    pub fn waiter_count(&self, key: &TileKey) -> usize {
        self.state.lock().waiter_count(key)
    }

    /// Resident and pending keys, sorted.
    pub fn tracked_keys(&self) -> Vec<TileKey> {
        let state = self.state.lock();
        let mut keys: Vec<TileKey> = state.tracked_keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending_count()
    }

    pub fn resident_count(&self) -> usize {
        self.state.lock().resident_count()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Logs current counters and cache occupancy.
    pub fn log_stats(&self) {
        let snapshot = self.stats.snapshot();
        let (pending, resident, waiter_entries) = {
            let state = self.state.lock();
            (
                state.pending_count(),
                state.resident_count(),
                state.waiter_entries(),
            )
        };
        info!(
            requests = snapshot.requests,
            fetches = snapshot.fetches_issued,
            coalesced = snapshot.coalesced,
            stored = snapshot.stored,
            gaps = snapshot.gaps,
            discarded = snapshot.discarded,
            failures = snapshot.failures,
            evictions = snapshot.evictions,
            pending,
            resident,
            waiter_entries,
            "Tile coordinator stats"
        );
    }
}

impl<T, P: ?Sized> fmt::Debug for TileDataCoordinator<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileDataCoordinator")
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{BinCounts, Rect};
    use crate::payload::TileData;
    use crate::pyramid::{AoiPyramid, PyramidError};
    use crate::transport::FetchCompletion;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Holds completions until the test resolves them.
    #[derive(Default)]
    struct ManualTransport {
        inflight: Mutex<Vec<(FetchRequest, FetchCompletion<u32>)>>,
        issued: Mutex<Vec<TileKey>>,
    }

    impl ManualTransport {
        fn issued(&self) -> Vec<TileKey> {
            self.issued.lock().clone()
        }

        fn take(&self, key: TileKey) -> Option<(FetchRequest, FetchCompletion<u32>)> {
            let mut inflight = self.inflight.lock();
            let pos = inflight.iter().position(|(r, _)| r.key() == key)?;
            Some(inflight.remove(pos))
        }

        fn resolve(&self, key: TileKey, result: Result<TilePayload<u32>, TransportError>) {
            let (_, completion) = self.take(key).expect("no fetch in flight for key");
            completion(result);
        }
    }

    impl TileTransport<u32> for ManualTransport {
        fn fetch(&self, request: FetchRequest, completion: FetchCompletion<u32>) {
            self.issued.lock().push(request.key());
            self.inflight.lock().push((request, completion));
        }
    }

    /// Unit tiles; root (x, y) lies in tile (floor x, floor y).
    struct UnitGrid;

    impl TilePyramid for UnitGrid {
        fn root_to_tile(
            &self,
            x: f64,
            y: f64,
            level: u8,
            bins: BinCounts,
        ) -> Result<TileCoord, PyramidError> {
            Ok(TileCoord::with_bin_counts(level, x as u32, y as u32, bins))
        }

        fn tile_bounds(&self, tile: &TileCoord) -> Rect {
            let x = tile.x_index as f64;
            let y = tile.y_index as f64;
            Rect::new(x, y, x + 1.0, y + 1.0)
        }

        fn name(&self) -> &str {
            "unit-grid"
        }
    }

    type Coordinator = TileDataCoordinator<u32, UnitGrid>;

    fn setup() -> (Arc<Coordinator>, Arc<ManualTransport>) {
        let transport = Arc::new(ManualTransport::default());
        let coordinator = Coordinator::new(Arc::new(UnitGrid), transport.clone());
        (coordinator, transport)
    }

    fn tile(x: u32, y: u32) -> TileCoord {
        TileCoord::with_bin_counts(3, x, y, BinCounts::new(2, 2).unwrap())
    }

    fn data(x: u32, y: u32) -> TilePayload<u32> {
        TilePayload::with_data(TileData::new(3, x, y, 2, 2, vec![1, 2, 3, 4]).unwrap())
    }

    /// Callback counting its invocations.
    fn counter() -> (TileReadyCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            Arc::new(move |_: &TileKey| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    fn noop() -> TileReadyCallback {
        Arc::new(|_: &TileKey| {})
    }

    #[test]
    fn test_request_issues_one_fetch_per_new_key() {
        let (coordinator, transport) = setup();

        let summary = coordinator.request_tiles(
            [tile(5, 10), tile(6, 10), tile(5, 10)],
            FetchContext::none(),
            noop(),
        );

        assert_eq!(summary.fetched.len(), 2);
        assert_eq!(transport.issued(), vec![tile(5, 10).key(), tile(6, 10).key()]);
        assert!(coordinator.is_pending(&tile(5, 10).key()));
        assert_eq!(coordinator.pending_count(), 2);
    }

    #[test]
    fn test_forwards_context_to_every_fetch() {
        let (coordinator, transport) = setup();
        let context = FetchContext::none().with_param("layer", "heat");

        coordinator.request_tiles([tile(0, 0), tile(1, 0)], context.clone(), noop());

        let (first, _) = transport.take(tile(0, 0).key()).unwrap();
        let (second, _) = transport.take(tile(1, 0).key()).unwrap();
        assert_eq!(first.context, context);
        assert_eq!(second.context, context);
        assert_eq!(first.coord.bin_counts(), BinCounts::new(2, 2).unwrap());
    }

    #[test]
    fn test_dedup_and_fan_out() {
        let (coordinator, transport) = setup();
        let (first, first_count) = counter();
        let (second, second_count) = counter();
        let keys = [tile(5, 10), tile(6, 10)];

        coordinator.request_tiles(keys, FetchContext::none(), first);
        let summary = coordinator.request_tiles(keys, FetchContext::none(), second);

        assert!(summary.fetched.is_empty());
        assert_eq!(summary.coalesced.len(), 2);
        assert_eq!(transport.issued().len(), 2);
        assert_eq!(coordinator.waiter_count(&tile(5, 10).key()), 2);

        transport.resolve(tile(5, 10).key(), Ok(data(5, 10)));
        transport.resolve(tile(6, 10).key(), Ok(data(6, 10)));

        assert_eq!(first_count.load(Ordering::SeqCst), 2);
        assert_eq!(second_count.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.stats().callbacks_fired, 4);
    }

    #[test]
    fn test_waiters_fire_in_registration_order() {
        let (coordinator, transport) = setup();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let order = order.clone();
            coordinator.request_tiles(
                [tile(0, 0)],
                FetchContext::none(),
                Arc::new(move |_: &TileKey| order.lock().push(label)),
            );
        }

        transport.resolve(tile(0, 0).key(), Ok(data(0, 0)));
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_resident_keys_are_not_refetched() {
        let (coordinator, transport) = setup();
        let (callback, count) = counter();

        coordinator.request_tiles([tile(1, 1)], FetchContext::none(), noop());
        transport.resolve(tile(1, 1).key(), Ok(data(1, 1)));

        let summary = coordinator.request_tiles([tile(1, 1)], FetchContext::none(), callback);
        assert_eq!(summary.resident, vec![tile(1, 1).key()]);
        assert_eq!(transport.issued().len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stale_keys_are_evicted_before_fetching() {
        let (coordinator, transport) = setup();

        coordinator.request_tiles([tile(0, 0), tile(1, 0)], FetchContext::none(), noop());
        transport.resolve(tile(0, 0).key(), Ok(data(0, 0)));

        let summary = coordinator.request_tiles([tile(2, 0)], FetchContext::none(), noop());

        assert_eq!(summary.evicted, vec![tile(0, 0).key(), tile(1, 0).key()]);
        assert_eq!(coordinator.tracked_keys(), vec![tile(2, 0).key()]);
        assert_eq!(coordinator.resident_count(), 0);
    }

    #[test]
    fn test_late_response_after_eviction_is_discarded() {
        let (coordinator, transport) = setup();
        let (callback, count) = counter();

        coordinator.request_tiles([tile(4, 4)], FetchContext::none(), callback);
        assert!(coordinator.release_tile(&tile(4, 4).key()));
        assert_eq!(coordinator.waiter_count(&tile(4, 4).key()), 0);

        transport.resolve(tile(4, 4).key(), Ok(data(4, 4)));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!coordinator.is_resident(&tile(4, 4).key()));
        assert!(coordinator.get_all_resident_bins().is_empty());
        assert_eq!(coordinator.stats().discarded, 1);
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let (coordinator, _transport) = setup();
        let (callback, count) = counter();

        coordinator.request_tiles([tile(2, 2)], FetchContext::none(), callback);

        assert_eq!(
            coordinator.on_fetch_complete(data(2, 2)),
            Completion::Stored {
                bins: 4,
                callbacks: 1
            }
        );
        assert_eq!(coordinator.on_fetch_complete(data(2, 2)), Completion::Discarded);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.get_all_resident_bins().len(), 4);
    }

    #[test]
    fn test_gap_clears_pending_without_callback() {
        let (coordinator, transport) = setup();
        let (callback, count) = counter();
        let key = tile(5, 10).key();

        coordinator.request_tiles([tile(5, 10)], FetchContext::none(), callback);
        transport.resolve(key, Ok(TilePayload::gap(key)));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!coordinator.is_pending(&key));
        assert_eq!(coordinator.waiter_count(&key), 0);
        assert_eq!(coordinator.resident_bins(&key), Some(Vec::new()));
        assert_eq!(coordinator.stats().gaps, 1);

        // A gap stays resident, so asking again does not refetch.
        coordinator.request_tiles([tile(5, 10)], FetchContext::none(), noop());
        assert_eq!(transport.issued().len(), 1);
    }

    #[test]
    fn test_failure_allows_retry() {
        let (coordinator, transport) = setup();
        let (callback, count) = counter();
        let key = tile(3, 3).key();

        coordinator.request_tiles([tile(3, 3)], FetchContext::none(), callback.clone());
        transport.resolve(key, Err(TransportError::Http("connection reset".into())));

        assert!(!coordinator.is_pending(&key));
        assert!(!coordinator.is_resident(&key));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.stats().failures, 1);

        let summary = coordinator.request_tiles([tile(3, 3)], FetchContext::none(), callback);
        assert_eq!(summary.fetched, vec![key]);
        transport.resolve(key, Ok(data(3, 3)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mismatched_payload_counts_as_failure() {
        let (coordinator, transport) = setup();
        let key = tile(1, 2).key();

        coordinator.request_tiles([tile(1, 2)], FetchContext::none(), noop());
        transport.resolve(key, Ok(data(7, 7)));

        assert!(!coordinator.is_pending(&key));
        assert!(!coordinator.is_resident(&tile(7, 7).key()));
        assert_eq!(coordinator.stats().failures, 1);
    }

    #[test]
    fn test_eviction_cycles_do_not_leak_waiters() {
        let (coordinator, transport) = setup();
        let a = [tile(0, 0), tile(1, 0)];
        let b = [tile(5, 5), tile(6, 5)];

        for _ in 0..50 {
            coordinator.request_tiles(a, FetchContext::none(), noop());
            coordinator.request_tiles(b, FetchContext::none(), noop());
        }

        assert_eq!(coordinator.pending_count(), 2);
        assert_eq!(coordinator.state.lock().waiter_entries(), 2);
        for coord in b {
            assert_eq!(coordinator.waiter_count(&coord.key()), 1);
        }
        for coord in a {
            assert_eq!(coordinator.waiter_count(&coord.key()), 0);
        }
        // Every cycle refetched, nothing got cached.
        assert_eq!(transport.issued().len(), 200);
        assert_eq!(coordinator.resident_count(), 0);
    }

    #[test]
    fn test_reentrant_callback_does_not_deadlock() {
        let (coordinator, transport) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&coordinator);
        let seen_in_callback = seen.clone();
        let callback: TileReadyCallback = Arc::new(move |key: &TileKey| {
            if let Some(coordinator) = weak.upgrade() {
                let bins = coordinator.get_all_resident_bins().len();
                seen_in_callback.lock().push((*key, bins));
                // Asking for the same tile again from inside the callback
                coordinator.request_tiles([tile(0, 0)], FetchContext::none(), noop());
            }
        });

        coordinator.request_tiles([tile(0, 0)], FetchContext::none(), callback);
        transport.resolve(tile(0, 0).key(), Ok(data(0, 0)));

        assert_eq!(*seen.lock(), vec![(tile(0, 0).key(), 4)]);
        assert_eq!(transport.issued().len(), 1);
    }

    #[test]
    fn test_synchronous_transport() {
        struct Immediate;

        impl TileTransport<u32> for Immediate {
            fn fetch(&self, request: FetchRequest, completion: FetchCompletion<u32>) {
                let key = request.key();
                completion(Ok(TilePayload::with_data(
                    TileData::new(key.level, key.x_index, key.y_index, 1, 1, vec![9]).unwrap(),
                )));
            }
        }

        let coordinator = Coordinator::new(Arc::new(UnitGrid), Arc::new(Immediate));
        let (callback, count) = counter();

        coordinator.request_tiles([tile(0, 0), tile(1, 0)], FetchContext::none(), callback);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.resident_count(), 2);
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[test]
    fn test_completion_after_drop_is_ignored() {
        let (coordinator, transport) = setup();
        coordinator.request_tiles([tile(0, 0)], FetchContext::none(), noop());
        drop(coordinator);

        transport.resolve(tile(0, 0).key(), Ok(data(0, 0)));
    }

    #[test]
    fn test_resident_bins_use_pyramid_corners() {
        let transport = Arc::new(ManualTransport::default());
        let pyramid = Arc::new(AoiPyramid::new(0.0, 0.0, 8.0, 8.0).unwrap());
        let coordinator =
            TileDataCoordinator::<u32, AoiPyramid>::new(pyramid, transport.clone());

        let coord = TileCoord::with_bin_counts(1, 1, 1, BinCounts::new(2, 2).unwrap());
        coordinator.request_tiles([coord], FetchContext::none(), noop());
        transport.resolve(
            coord.key(),
            Ok(TilePayload::with_data(
                TileData::new(1, 1, 1, 2, 2, vec![10, 20, 30, 40]).unwrap(),
            )),
        );

        let bins = coordinator.resident_bins(&coord.key()).unwrap();
        let corners: Vec<_> = bins.iter().map(|b| (b.longitude, b.latitude, b.bin)).collect();
        assert_eq!(
            corners,
            vec![(4.0, 8.0, 10), (6.0, 8.0, 20), (4.0, 6.0, 30), (6.0, 6.0, 40)]
        );
    }

    #[test]
    fn test_dyn_pyramid_default() {
        let transport = Arc::new(ManualTransport::default());
        let pyramid: Arc<dyn TilePyramid> = Arc::new(UnitGrid);
        let coordinator = TileDataCoordinator::<u32>::new(pyramid, transport);

        assert_eq!(coordinator.pyramid().name(), "unit-grid");
        coordinator.log_stats();
    }
}
