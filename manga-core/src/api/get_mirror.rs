use async_trait::async_trait;
use serde::Deserialize;

use crate::{MirrorDescriptor, Request, Result};

use super::Client;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
struct Chapter {
    hash: String,
    data: Vec<String>,
    #[serde(rename = "dataSaver", default)]
    data_saver: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
struct AtHome {
    #[serde(rename = "baseUrl")]
    base_url: String,
    chapter: Chapter,
}

/// Get a fresh at-home mirror for the given chapter id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GetMirror {
    chapter_id: String,
}

impl GetMirror {
    pub fn new(chapter_id: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
        }
    }
}

#[async_trait]
impl Request for GetMirror {
    type Response = MirrorDescriptor;

    async fn request(self, client: &Client) -> Result<MirrorDescriptor> {
        let url = client.endpoint(&format!("at-home/server/{}", self.chapter_id))?;
        let at_home = client.get_json::<AtHome>(url, "get_mirror").await?;
        Ok(MirrorDescriptor {
            base_url: at_home.base_url,
            content_hash: at_home.chapter.hash,
            standard_pages: at_home.chapter.data,
            reduced_pages: at_home.chapter.data_saver,
        })
    }
}
