use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::models::{
    Address, AssetMembership, AssetMetadata, AssetType, ObjectDescriptor, ObjectFilter, ObjectId,
    ObjectOptions,
};
use crate::traits::chain_client::ChainQueryClient;

/// Largest id list a full node accepts in one `sui_multiGetObjects` call.
pub const MAX_OBJECTS_PER_CALL: usize = 50;
/// Page size for cursor-paginated queries.
pub const PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> anyhow::Result<Option<T>> {
        match self.error {
            Some(err) => Err(anyhow::anyhow!(
                "{} failed with code {}: {}",
                method,
                err.code,
                err.message
            )),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    next_cursor: Option<Value>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectData>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    #[serde(rename = "type")]
    type_: Option<String>,
    content: Option<MoveContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveContent {
    data_type: String,
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicFieldInfo {
    name: DynamicFieldName,
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct DynamicFieldName {
    value: Value,
}

impl ObjectResponse {
    fn into_descriptor(self) -> Option<ObjectDescriptor> {
        if let Some(error) = &self.error {
            debug!("Object query returned error: {}", error);
        }
        let data = self.data?;
        let fields = data
            .content
            .filter(|c| c.data_type == "moveObject")
            .and_then(|c| c.fields);

        Some(ObjectDescriptor {
            object_id: ObjectId::new(data.object_id),
            type_: data.type_,
            fields,
        })
    }
}

impl From<DynamicFieldInfo> for AssetMembership {
    fn from(info: DynamicFieldInfo) -> Self {
        let name = match info.name.value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        AssetMembership {
            object_id: ObjectId::new(info.object_id),
            name,
        }
    }
}

/// One entry per requested id, matched by object id; ids the node left out
/// or answered with an error are `None`.
fn align_to_request(ids: &[ObjectId], responses: Vec<ObjectResponse>) -> Vec<Option<ObjectDescriptor>> {
    let mut by_id: HashMap<ObjectId, ObjectDescriptor> = responses
        .into_iter()
        .filter_map(ObjectResponse::into_descriptor)
        .map(|d| (d.object_id.clone(), d))
        .collect();
    ids.iter().map(|id| by_id.remove(id)).collect()
}

fn options_json(options: ObjectOptions) -> Value {
    json!({
        "showType": options.show_type,
        "showContent": options.show_content,
    })
}

/// Sui JSON-RPC client (polling approach)
pub struct SuiRpcClient {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    /// Create a new RPC client for a full node URL
    pub fn new(rpc_url: impl Into<String>) -> Self {
        let rpc_url = rpc_url.into();
        info!("Using Sui RPC at {}", rpc_url);
        Self {
            client: Client::new(),
            rpc_url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> anyhow::Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("RPC {} (id {})", method, id);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("sending {}", method))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("{} returned HTTP {}: {}", method, status, body));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("decoding {} response", method))?;
        parsed.into_result(method)
    }

    /// Walk a cursor-paginated method to the end. `params` receives the
    /// cursor and must return the full parameter list.
    async fn paginate<T: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Fn(Value) -> Value,
    ) -> anyhow::Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor = Value::Null;
        loop {
            let page: Page<T> = self
                .call(method, params(cursor.clone()))
                .await?
                .ok_or_else(|| anyhow::anyhow!("{} returned no result", method))?;
            items.extend(page.data);

            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = next,
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ChainQueryClient for SuiRpcClient {
    async fn get_owned_objects(
        &self,
        owner: &Address,
        filter: &ObjectFilter,
    ) -> anyhow::Result<Vec<ObjectDescriptor>> {
        let filter = match filter {
            ObjectFilter::StructType(t) => json!({ "StructType": t }),
        };
        let query = json!({
            "filter": filter,
            "options": options_json(ObjectOptions::default()),
        });

        let responses: Vec<ObjectResponse> = self
            .paginate("suix_getOwnedObjects", |cursor| {
                json!([owner.as_str(), query, cursor, PAGE_LIMIT])
            })
            .await?;

        Ok(responses
            .into_iter()
            .filter_map(ObjectResponse::into_descriptor)
            .collect())
    }

    async fn multi_get_objects(
        &self,
        ids: &[ObjectId],
        options: ObjectOptions,
    ) -> anyhow::Result<Vec<Option<ObjectDescriptor>>> {
        let mut descriptors = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_OBJECTS_PER_CALL) {
            // a failed chunk costs only its own entries
            let responses: Vec<ObjectResponse> = match self
                .call("sui_multiGetObjects", json!([chunk, options_json(options)]))
                .await
            {
                Ok(responses) => responses.unwrap_or_default(),
                Err(e) => {
                    warn!("sui_multiGetObjects failed for {} ids: {:#}", chunk.len(), e);
                    Vec::new()
                }
            };

            if responses.len() != chunk.len() {
                warn!(
                    "sui_multiGetObjects returned {} entries for {} ids",
                    responses.len(),
                    chunk.len()
                );
            }
            descriptors.extend(align_to_request(chunk, responses));
        }
        Ok(descriptors)
    }

    async fn get_dynamic_fields(&self, parent: &ObjectId) -> anyhow::Result<Vec<AssetMembership>> {
        let fields: Vec<DynamicFieldInfo> = self
            .paginate("suix_getDynamicFields", |cursor| {
                json!([parent.as_str(), cursor, PAGE_LIMIT])
            })
            .await?;
        Ok(fields.into_iter().map(AssetMembership::from).collect())
    }

    async fn get_coin_metadata(&self, asset_type: &AssetType) -> anyhow::Result<Option<AssetMetadata>> {
        self.call("suix_getCoinMetadata", json!([asset_type.as_str()]))
            .await
    }
}
