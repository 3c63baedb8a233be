//! Timing record of the most recent render batch.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Phase durations are summed over the views of a batch. Replaced
/// wholesale after each batch; nothing is accumulated across batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatistics {
    #[serde(rename = "dataFetchMs", serialize_with = "as_millis")]
    pub data_fetch: Duration,
    #[serde(rename = "templateRenderMs", serialize_with = "as_millis")]
    pub template_render: Duration,
    #[serde(rename = "imageConversionMs", serialize_with = "as_millis")]
    pub image_conversion: Duration,
    #[serde(rename = "totalMs", serialize_with = "as_millis")]
    pub total: Duration,
    /// Size of the device-facing raster, or of the last view raster when
    /// publication failed.
    pub output_size: u64,
    pub views_rendered: usize,
    pub views_failed: usize,
    pub completed_at: Option<DateTime<Local>>,
}

impl RenderStatistics {
    pub fn is_empty(&self) -> bool {
        self.completed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_serialize_as_milliseconds() {
        let stats = RenderStatistics {
            data_fetch: Duration::from_millis(12),
            template_render: Duration::from_micros(3_900),
            image_conversion: Duration::from_secs(2),
            total: Duration::from_millis(2_016),
            output_size: 4096,
            views_rendered: 3,
            views_failed: 0,
            completed_at: None,
        };
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["dataFetchMs"], 12);
        assert_eq!(v["templateRenderMs"], 3);
        assert_eq!(v["imageConversionMs"], 2000);
        assert_eq!(v["outputSize"], 4096);
        assert_eq!(v["viewsRendered"], 3);
        assert!(v["completedAt"].is_null());
    }

    #[test]
    fn default_is_empty() {
        assert!(RenderStatistics::default().is_empty());
    }
}
