use serde::Deserialize;
use serde::Serialize;

/// What kind of entity a feature maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureType {
    Sensor,
    BinarySensor,
    Switch,
    Action,
    Number,
    Choice,
    #[serde(other)]
    Unknown,
}

/// How prominent a feature is on its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureCategory {
    /// The main state of the device, e.g. on/off
    Primary,
    Config,
    Info,
    Debug,
    /// Not categorised by the device library
    #[serde(other)]
    Unset,
}

/// A single capability exposed by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable key, unique per device
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub feature_type: FeatureType,

    pub category: FeatureCategory,

    /// Current value as last read by the device library
    #[serde(default)]
    pub value: serde_json::Value,

    /// Allowed values for choice features
    #[serde(default)]
    pub choices: Option<Vec<String>>,

    #[serde(default)]
    pub minimum_value: Option<f64>,

    #[serde(default)]
    pub maximum_value: Option<f64>,

    #[serde(default)]
    pub unit: Option<String>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        feature_type: FeatureType,
        category: FeatureCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            feature_type,
            category,
            value: serde_json::Value::Null,
            choices: None,
            minimum_value: None,
            maximum_value: None,
            unit: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum_value = Some(minimum);
        self.maximum_value = Some(maximum);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}
