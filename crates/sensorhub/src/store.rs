use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub name: String,
    pub model: String,
    pub location: Option<String>,
}

impl Sensor {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No sensor was found with the name {0}")]
    NotFound(String),
    #[error("Sensor with name '{0}' already exists.")]
    Duplicate(String),
}

/// Sensors in insertion order, shared between request handlers.
#[derive(Debug, Clone, Default)]
pub struct SensorStore {
    sensors: Arc<RwLock<Vec<Sensor>>>,
}

impl SensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensors(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors: Arc::new(RwLock::new(sensors)),
        }
    }

    pub fn with_demo_data() -> Self {
        Self::with_sensors(vec![
            Sensor::new("uo-donkeysensor-1", "donkeysensor2000").at("donkey"),
            Sensor::new("uo-imagingsensor-1", "imagingsensor3000").at("lab"),
            Sensor::new("uo-thermometer-1", "TMP100"),
        ])
    }

    pub async fn list(&self) -> Vec<Sensor> {
        self.sensors.read().await.clone()
    }

    pub async fn get(&self, name: &str) -> Option<Sensor> {
        self.sensors
            .read()
            .await
            .iter()
            .find(|sensor| sensor.name == name)
            .cloned()
    }

    pub async fn insert(&self, sensor: Sensor) -> Result<(), StoreError> {
        let mut sensors = self.sensors.write().await;
        if sensors.iter().any(|existing| existing.name == sensor.name) {
            return Err(StoreError::Duplicate(sensor.name));
        }
        sensors.push(sensor);
        Ok(())
    }

    /// Renames and re-models `name`; location is not editable.
    pub async fn update(&self, name: &str, new_name: &str, model: &str) -> Result<(), StoreError> {
        let mut sensors = self.sensors.write().await;
        if new_name != name && sensors.iter().any(|existing| existing.name == new_name) {
            return Err(StoreError::Duplicate(new_name.to_string()));
        }
        let sensor = sensors
            .iter_mut()
            .find(|sensor| sensor.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        sensor.name = new_name.to_string();
        sensor.model = model.to_string();
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut sensors = self.sensors.write().await;
        let index = sensors
            .iter()
            .position(|sensor| sensor.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        sensors.remove(index);
        Ok(())
    }
}
