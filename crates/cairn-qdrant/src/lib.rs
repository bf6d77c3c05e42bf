//! Qdrant-backed vector store
//!
//! [`QdrantStore`] implements both sides of the knowledge layer: the
//! [`VectorWriter`] that ingests chunks and the [`RetrievalPlugin`] that
//! answers dense queries. Embeddings come from a caller-supplied
//! [`Embedder`], so the store itself stays model-agnostic.
//!
//! Point ids are derived from the chunk's content hash, so writing the
//! same content twice converges on one point instead of accumulating
//! duplicates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use uuid::Uuid;

use cairn_core::{
    Chunk, Embedder, Error, Result, RetrievalPlugin, UpsertStats, VectorWriter,
};

/// Vector store over a Qdrant collection
pub struct QdrantStore {
    client: Qdrant,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl QdrantStore {
    /// Connect to Qdrant and ensure the collection exists.
    ///
    /// Creates the collection with cosine distance when it is missing;
    /// `vector_size` must match the embedder's output dimension.
    pub async fn connect(
        url: &str,
        api_key: Option<&str>,
        collection: &str,
        vector_size: u64,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Configuration(format!("qdrant client setup failed: {e}")))?;

        let exists = client
            .collection_exists(collection)
            .await
            .map_err(|e| Error::Knowledge(format!("qdrant collection check failed: {e}")))?;
        if !exists {
            tracing::info!(collection, vector_size, "creating qdrant collection");
            client
                .create_collection(
                    CreateCollectionBuilder::new(collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(|e| Error::Knowledge(format!("qdrant collection create failed: {e}")))?;
        }

        Ok(Self {
            client,
            embedder,
            collection: collection.to_string(),
        })
    }
}

/// Stable point id for a chunk, derived from its content hash
fn point_id(chunk: &Chunk) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk.content_hash().as_bytes()).to_string()
}

fn payload_for_chunk(chunk: &Chunk) -> Result<Payload> {
    let metadata: serde_json::Map<String, serde_json::Value> = chunk
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let json = serde_json::json!({
        "chunk_id": chunk.id,
        "document_id": chunk.document_id,
        "text": chunk.text,
        "offset": chunk.offset as i64,
        "metadata": serde_json::Value::Object(metadata),
    });
    Payload::try_from(json).map_err(|e| Error::Knowledge(format!("qdrant payload build failed: {e}")))
}

fn value_str(value: &Value) -> Option<&str> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn value_int(value: &Value) -> Option<i64> {
    match &value.kind {
        Some(Kind::IntegerValue(i)) => Some(*i),
        _ => None,
    }
}

fn value_json(value: &Value) -> serde_json::Value {
    match &value.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::DoubleValue(d)) => serde_json::json!(d),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        _ => serde_json::Value::Null,
    }
}

/// Rebuild a chunk from a stored payload; `None` on malformed points
fn chunk_from_payload(payload: &HashMap<String, Value>, score: f32) -> Option<Chunk> {
    let id = payload.get("chunk_id").and_then(value_str)?;
    let document_id = payload.get("document_id").and_then(value_str)?;
    let text = payload.get("text").and_then(value_str)?;
    let offset = payload.get("offset").and_then(value_int)? as usize;

    let mut chunk = Chunk::new(id, document_id, text, offset).with_score(score);
    if let Some(Kind::StructValue(fields)) =
        payload.get("metadata").and_then(|v| v.kind.as_ref())
    {
        for (key, value) in &fields.fields {
            chunk = chunk.with_metadata(key, value_json(value));
        }
    }
    Some(chunk)
}

/// Metadata filters as a qdrant payload filter
fn metadata_filter(filters: &BTreeMap<String, String>) -> Option<Filter> {
    if filters.is_empty() {
        return None;
    }
    Some(Filter::must(
        filters
            .iter()
            .map(|(key, value)| Condition::matches(format!("metadata.{key}"), value.clone())),
    ))
}

#[async_trait]
impl VectorWriter for QdrantStore {
    async fn upsert(&self, chunks: Vec<Chunk>) -> Result<UpsertStats> {
        let mut stats = UpsertStats::default();

        // collapse intra-batch duplicates before touching the network
        let mut batch: Vec<(String, Chunk)> = Vec::new();
        for chunk in chunks {
            let id = point_id(&chunk);
            if batch.iter().any(|(existing, _)| *existing == id) {
                stats.deduplicated += 1;
            } else {
                batch.push((id, chunk));
            }
        }
        if batch.is_empty() {
            return Ok(stats);
        }

        // ids already stored count as deduplicated, not inserted
        let ids: Vec<_> = batch.iter().map(|(id, _)| id.clone().into()).collect();
        let existing = self
            .client
            .get_points(GetPointsBuilder::new(self.collection.as_str(), ids))
            .await
            .map_err(|e| Error::Knowledge(format!("qdrant point lookup failed: {e}")))?;
        let existing_count = existing.result.len();

        let texts: Vec<String> = batch.iter().map(|(_, c)| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(Error::Knowledge(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        let points: Vec<PointStruct> = batch
            .iter()
            .zip(embeddings)
            .map(|((id, chunk), vector)| {
                Ok(PointStruct::new(id.clone(), vector, payload_for_chunk(chunk)?))
            })
            .collect::<Result<_>>()?;

        let upserted = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.as_str(), points).wait(true))
            .await
            .map_err(|e| Error::Knowledge(format!("qdrant upsert failed: {e}")))?;

        stats.deduplicated += existing_count;
        stats.inserted += upserted - existing_count;
        tracing::debug!(
            inserted = stats.inserted,
            deduplicated = stats.deduplicated,
            collection = %self.collection,
            "qdrant upsert finished"
        );
        Ok(stats)
    }
}

#[async_trait]
impl RetrievalPlugin for QdrantStore {
    async fn retrieve(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Chunk>> {
        let embeddings = self.embedder.embed(&[query_text.to_string()]).await?;
        let vector = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Knowledge("embedder returned no query vector".to_string()))?;

        let mut search = SearchPointsBuilder::new(self.collection.as_str(), vector, top_k as u64)
            .with_payload(true);
        if let Some(filter) = metadata_filter(filters) {
            search = search.filter(filter);
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| Error::Knowledge(format!("qdrant search failed: {e}")))?;

        let chunks: Vec<Chunk> = response
            .result
            .iter()
            .filter_map(|point| chunk_from_payload(&point.payload, point.score))
            .collect();
        tracing::debug!(retrieved = chunks.len(), collection = %self.collection, "qdrant search finished");
        Ok(chunks)
    }
}
