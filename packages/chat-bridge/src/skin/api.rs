//! Public skin lookup keyed by a player's external id.

use serde::Deserialize;

use super::config::{SkinConfig, LOOKUP_TIMEOUT};
use super::store::SkinRecord;
use crate::error::Result;
use crate::http::Fetcher;

#[derive(Debug, Default, Deserialize)]
pub struct SkinResponse {
    pub value: Option<String>,
    pub signature: Option<String>,
    pub hash: Option<String>,
    pub texture_id: Option<String>,
}

impl SkinResponse {
    /// A blank value means the service has nothing for this player.
    pub fn into_record(self) -> Option<SkinRecord> {
        let value = self.value.filter(|v| !v.trim().is_empty())?;
        Some(SkinRecord {
            value,
            signature: self.signature,
            hash: self.hash,
            texture_id: self.texture_id,
        })
    }
}

pub async fn fetch_skin(fetcher: &Fetcher, config: &SkinConfig, external_id: &str) -> Result<Option<SkinRecord>> {
    let request = fetcher.get(&config.lookup_url(external_id), LOOKUP_TIMEOUT);
    let response: SkinResponse = fetcher.send_json(request).await?;
    Ok(response.into_record())
}
