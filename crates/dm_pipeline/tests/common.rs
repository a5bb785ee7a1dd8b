// Shared fixtures for the pipeline integration tests

use std::sync::Arc;

use dm_classifier::RuleClassifier;
use dm_core::StorageHandle;
use dm_pipeline::{ChannelBroadcaster, Pipeline};
use dm_storage::{create_storage, BackendConfig};
use serde_json::{json, Value};

pub const STORM_CONTENT: &str = "Bão số 3 đổ bộ vào Quảng Ninh với gió mạnh cấp 12, \
    làm 2 người chết và hàng trăm căn nhà bị tốc mái. Chính quyền đã sơ tán người dân.";

pub const SPORTS_CONTENT: &str = "Đội tuyển Việt Nam giành chiến thắng thuyết phục trong trận \
    giao hữu tối qua trước sự cổ vũ nhiệt tình của khán giả.";

pub async fn memory_pipeline() -> (Pipeline, ChannelBroadcaster) {
    let storage = create_storage(&BackendConfig::default())
        .await
        .expect("memory storage");
    let broadcaster = ChannelBroadcaster::default();
    let pipeline = Pipeline::new(
        Arc::new(RuleClassifier::new()),
        StorageHandle::connected(storage),
        Arc::new(broadcaster.clone()),
    );
    (pipeline, broadcaster)
}

pub fn storm(url: &str) -> Value {
    json!({
        "url": url,
        "title": "Bão số 3 đổ bộ Quảng Ninh",
        "text": STORM_CONTENT,
        "source": "https://www.vnexpress.net/thoi-su",
        "publish_date": "2024-09-07T10:00:00+07:00"
    })
}

pub fn sports(url: &str) -> Value {
    json!({
        "url": url,
        "title": "Tuyển Việt Nam thắng giao hữu",
        "content": SPORTS_CONTENT,
        "source": "Tuổi Trẻ"
    })
}
