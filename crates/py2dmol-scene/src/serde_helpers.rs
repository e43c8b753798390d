//! Serde helpers for types that don't natively support serde.

pub mod vec3_serde {
    use lin_alg::f64::Vec3;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [v.x, v.y, v.z].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y, z]: [f64; 3] = Deserialize::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}

/// Session version stored as text ("2.0"); numbers are accepted on read.
pub mod version_serde {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVersion {
        Text(String),
        Integer(u64),
        Float(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawVersion::deserialize(deserializer)? {
            RawVersion::Text(s) => s,
            RawVersion::Integer(n) => n.to_string(),
            RawVersion::Float(x) => format!("{x:?}"),
        })
    }
}
