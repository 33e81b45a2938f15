//! Snapshot manifest and the instances it describes.

use serde::{Deserialize, Serialize};

/// A deployed instance the director manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedInstance {
    pub deployment: String,
    pub job: String,
    pub index: u32,
    pub agent_id: String,
    pub instance_id: String,
    /// Persistent disk attached to the instance, if any.
    #[serde(default)]
    pub persistent_disk_cid: Option<String>,
}

/// Record written next to every disk snapshot.
///
/// The key set is closed: readers reject any extra key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotManifest {
    pub deployment: String,
    pub job: String,
    pub index: u32,
    pub director_name: String,
    pub director_uuid: String,
    pub agent_id: String,
    pub instance_id: String,
}

impl SnapshotManifest {
    pub fn for_instance(instance: &ManagedInstance, director_name: &str, director_uuid: &str) -> Self {
        Self {
            deployment: instance.deployment.clone(),
            job: instance.job.clone(),
            index: instance.index,
            director_name: director_name.to_string(),
            director_uuid: director_uuid.to_string(),
            agent_id: instance.agent_id.clone(),
            instance_id: instance.instance_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance() -> ManagedInstance {
        ManagedInstance {
            deployment: "simple".to_string(),
            job: "foobar".to_string(),
            index: 0,
            agent_id: "agent-1".to_string(),
            instance_id: "i-1".to_string(),
            persistent_disk_cid: Some("vol-1".to_string()),
        }
    }

    #[test]
    fn manifest_has_exactly_the_seven_keys() {
        let manifest = SnapshotManifest::for_instance(&instance(), "Test Director", "deadbeef");
        let value = serde_json::to_value(&manifest).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "agent_id",
                "deployment",
                "director_name",
                "director_uuid",
                "index",
                "instance_id",
                "job",
            ]
        );
    }

    #[test]
    fn manifest_rejects_extra_keys() {
        let result = serde_json::from_value::<SnapshotManifest>(json!({
            "deployment": "simple",
            "job": "foobar",
            "index": 0,
            "director_name": "d",
            "director_uuid": "u",
            "agent_id": "a",
            "instance_id": "i",
            "disk_cid": "vol-1",
        }));
        assert!(result.is_err());
    }
}
