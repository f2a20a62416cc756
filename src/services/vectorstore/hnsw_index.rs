//! In-Process HNSW Vector Index
//!
//! Wraps the `hnsw_rs` crate to provide approximate nearest neighbor search
//! without an external service. Useful for local runs and tests; nothing is
//! persisted.
//!
//! ## Thread Safety
//!
//! Graph and record table live behind one `RwLock` so a search never maps
//! neighbour ids against a table from a different generation. CPU-bound
//! searches are offloaded to `tokio::task::spawn_blocking`.
//!
//! ## Replacement
//!
//! `hnsw_rs` has no point deletion. Upserting an existing id appends a new
//! point and tombstones the old one; tombstoned points are filtered from
//! results. `delete_all` swaps in a fresh graph.

use async_trait::async_trait;
use hnsw_rs::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use citerag_core::VectorRecord;

use super::service::{IndexStats, StoreError, StoreResult, VectorIndexService, VectorMatch};

/// HNSW tuning parameters.
const MAX_NB_CONNECTION: usize = 24;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;

/// The `'static` lifetime holds because the graph owns every inserted vector.
struct HnswInner {
    hnsw: Hnsw<'static, f32, DistCosine>,
}

// SAFETY: hnsw_rs::Hnsw<'static, f32, DistCosine> uses Arc-based internal
// storage and is safe to share across threads.
unsafe impl Send for HnswInner {}
unsafe impl Sync for HnswInner {}

struct StoredPoint {
    id: String,
    metadata: Map<String, Value>,
}

struct IndexState {
    graph: Arc<HnswInner>,
    /// Indexed by HNSW data id. `None` marks a replaced point.
    points: Vec<Option<StoredPoint>>,
    by_id: HashMap<String, usize>,
}

impl IndexState {
    fn empty(max_elements: usize) -> Self {
        let hnsw = Hnsw::<f32, DistCosine>::new(
            MAX_NB_CONNECTION,
            max_elements,
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistCosine,
        );
        Self {
            graph: Arc::new(HnswInner { hnsw }),
            points: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    fn live_count(&self) -> usize {
        self.by_id.len()
    }

    fn tombstone_count(&self) -> usize {
        self.points.len() - self.by_id.len()
    }
}

pub struct HnswVectorIndex {
    dimension: usize,
    max_elements: usize,
    state: RwLock<IndexState>,
}

impl HnswVectorIndex {
    pub fn new(dimension: usize, max_elements: usize) -> StoreResult<Self> {
        if dimension == 0 || max_elements == 0 {
            return Err(StoreError::InvalidConfig {
                message: "HNSW index needs a positive dimension and capacity".to_string(),
            });
        }
        Ok(Self {
            dimension,
            max_elements,
            state: RwLock::new(IndexState::empty(max_elements)),
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> StoreResult<()> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndexService for HnswVectorIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> StoreResult<()> {
        for record in records {
            self.check_dimension(&record.values)?;
        }

        let mut state = self.state.write().await;
        for record in records {
            let data_id = state.points.len();
            if let Some(old) = state.by_id.insert(record.id.clone(), data_id) {
                state.points[old] = None;
            }
            state.points.push(Some(StoredPoint {
                id: record.id.clone(),
                metadata: record.metadata_map(),
            }));
            state.graph.hnsw.insert_slice((record.values.as_slice(), data_id));
        }

        debug!(
            inserted = records.len(),
            live = state.live_count(),
            tombstoned = state.tombstone_count(),
            "HNSW upsert"
        );
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> StoreResult<Vec<VectorMatch>> {
        self.check_dimension(vector)?;

        let state = self.state.read().await;
        if top_k == 0 || state.live_count() == 0 {
            return Ok(Vec::new());
        }

        let graph = Arc::clone(&state.graph);
        let query_vec = vector.to_vec();
        // Request extra results to compensate for tombstone filtering
        let request_k = top_k + state.tombstone_count();
        let ef = EF_SEARCH.max(request_k * 2);

        let neighbours = tokio::task::spawn_blocking(move || graph.hnsw.search(&query_vec, request_k, ef))
            .await
            .map_err(|e| StoreError::Other {
                message: format!("HNSW search task failed: {}", e),
            })?;

        let mut matches: Vec<VectorMatch> = neighbours
            .into_iter()
            .filter_map(|n| {
                let point = state.points.get(n.d_id)?.as_ref()?;
                Some(VectorMatch {
                    id: point.id.clone(),
                    // DistCosine reports 1 - cos; convert back to similarity.
                    score: 1.0 - n.distance,
                    metadata: include_metadata.then(|| point.metadata.clone()),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_all(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let removed = state.live_count();
        *state = IndexState::empty(self.max_elements);
        info!(removed, "HNSW index cleared");
        Ok(())
    }

    async fn describe_stats(&self) -> StoreResult<IndexStats> {
        let state = self.state.read().await;
        let live = state.live_count();
        Ok(IndexStats {
            total_vectors: live as u64,
            dimension: self.dimension,
            index_fullness: (live as f32 / self.max_elements as f32).min(1.0),
        })
    }

    fn name(&self) -> &'static str {
        "hnsw"
    }
}
