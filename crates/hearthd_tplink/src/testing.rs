//! Fixtures and mocks shared by unit tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::coordinator::DeviceCoordinator;
use crate::device::Device;
use crate::device::DeviceClient;
use crate::device::DeviceError;
use crate::device::DeviceFamily;
use crate::device::DeviceType;
use crate::device::Feature;
use crate::device::FeatureCategory;
use crate::device::FeatureType;
use crate::device::HwInfo;

#[derive(Debug)]
struct MockState {
    device: Device,
    update_error: Option<DeviceError>,
    write_error: Option<DeviceError>,
    updates: usize,
    writes: Vec<(String, String, serde_json::Value)>,
}

/// Mock device library client
///
/// Clones share state, so a test can keep a handle after moving one into a
/// coordinator.
#[derive(Debug, Clone)]
pub struct MockDeviceClient {
    state: Arc<Mutex<MockState>>,
}

impl MockDeviceClient {
    pub fn new(device: Device) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                device,
                update_error: None,
                write_error: None,
                updates: 0,
                writes: Vec::new(),
            })),
        }
    }

    /// Mutate the device the next update will return
    pub fn edit(&self, f: impl FnOnce(&mut Device)) {
        f(&mut self.state.lock().unwrap().device);
    }

    pub fn fail_updates(&self, error: DeviceError) {
        self.state.lock().unwrap().update_error = Some(error);
    }

    pub fn succeed_updates(&self) {
        self.state.lock().unwrap().update_error = None;
    }

    pub fn fail_writes(&self, error: DeviceError) {
        self.state.lock().unwrap().write_error = Some(error);
    }

    /// Number of snapshot fetches so far
    pub fn updates(&self) -> usize {
        self.state.lock().unwrap().updates
    }

    /// Writes performed so far as (device_id, feature_id, value)
    pub fn writes(&self) -> Vec<(String, String, serde_json::Value)> {
        self.state.lock().unwrap().writes.clone()
    }
}

#[async_trait]
impl DeviceClient for MockDeviceClient {
    async fn update(&self) -> Result<Device, DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        match &state.update_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.device.clone()),
        }
    }

    async fn set_feature_value(
        &self,
        device_id: &str,
        feature_id: &str,
        value: serde_json::Value,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.write_error {
            return Err(e.clone());
        }
        state
            .writes
            .push((device_id.to_string(), feature_id.to_string(), value.clone()));

        // Applied so the next update reflects the write
        if let Some(feature) = state
            .device
            .find_mut(device_id)
            .and_then(|d| d.feature_mut(feature_id))
        {
            feature.value = value;
        }
        Ok(())
    }
}

/// Coordinator over `device` plus a handle on its mock client
pub fn coordinator(device: Device) -> (Arc<DeviceCoordinator<MockDeviceClient>>, MockDeviceClient) {
    let client = MockDeviceClient::new(device.clone());
    (
        Arc::new(DeviceCoordinator::new(client.clone(), device)),
        client,
    )
}

/// Counts WARN events emitted while installed
#[derive(Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Counts ERROR events emitted while installed
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn device(device_id: &str, alias: &str, model: &str, mac: &str, device_type: DeviceType) -> Device {
    Device {
        device_id: device_id.to_string(),
        alias: alias.to_string(),
        model: model.to_string(),
        mac: mac.to_string(),
        device_type,
        family: DeviceFamily::Smart,
        hw_info: HwInfo {
            sw_ver: "1.0.12".to_string(),
            hw_ver: "1.0".to_string(),
        },
        features: Vec::new(),
        children: Vec::new(),
    }
}

fn state_feature(on: bool) -> Feature {
    Feature::new("state", "State", FeatureType::Switch, FeatureCategory::Primary).with_value(on)
}

fn rssi_feature() -> Feature {
    Feature::new("rssi", "RSSI", FeatureType::Sensor, FeatureCategory::Info)
        .with_value(-40)
        .with_unit("dBm")
}

/// Legacy single-outlet plug
pub fn plug(device_id: &str, alias: &str) -> Device {
    let mut plug = device(device_id, alias, "HS100", "50:c7:bf:00:00:10", DeviceType::Plug);
    plug.family = DeviceFamily::Iot;
    plug.features = vec![
        state_feature(true),
        Feature::new("led", "LED", FeatureType::Switch, FeatureCategory::Config).with_value(true),
        rssi_feature(),
        Feature::new("reboot", "Reboot", FeatureType::Action, FeatureCategory::Debug),
    ];
    plug
}

/// Legacy power strip with two sockets
pub fn strip_with_sockets() -> Device {
    let mut strip = device("strip-1", "Power Strip", "HS300", "50:c7:bf:00:00:01", DeviceType::Strip);
    strip.family = DeviceFamily::Iot;
    strip.features = vec![
        rssi_feature(),
        Feature::new("led", "LED", FeatureType::Switch, FeatureCategory::Config).with_value(true),
    ];

    let socket = |id: &str, alias: &str, on: bool| {
        let mut socket = device(id, alias, "HS300", "50:c7:bf:00:00:01", DeviceType::StripSocket);
        socket.family = DeviceFamily::Iot;
        socket.features = vec![
            state_feature(on),
            Feature::new(
                "auto_off_enabled",
                "Auto off enabled",
                FeatureType::Switch,
                FeatureCategory::Config,
            )
            .with_value(false),
            Feature::new(
                "current_consumption",
                "Current consumption",
                FeatureType::Sensor,
                FeatureCategory::Primary,
            )
            .with_value(12.5)
            .with_unit("W"),
            Feature::new("on_since", "On since", FeatureType::Sensor, FeatureCategory::Debug)
                .with_value("2024-01-01T00:00:00Z"),
        ];
        socket
    };
    strip.children = vec![socket("strip-1-01", "Kettle", true), socket("strip-1-02", "Lamp", false)];
    strip
}

/// Newer-protocol color bulb
pub fn bulb() -> Device {
    let mut bulb = device("bulb-1", "Desk Lamp", "L530", "aa:bb:cc:dd:ee:01", DeviceType::Bulb);
    bulb.features = vec![
        state_feature(true),
        Feature::new("brightness", "Brightness", FeatureType::Number, FeatureCategory::Primary)
            .with_value(80)
            .with_range(0.0, 100.0),
        Feature::new("light_effect", "Light effect", FeatureType::Choice, FeatureCategory::Config)
            .with_value("Off")
            .with_choices(["Off", "Party", "Relax"]),
        rssi_feature(),
        Feature::new("overheated", "Overheated", FeatureType::BinarySensor, FeatureCategory::Info)
            .with_value(false),
    ];
    bulb
}

/// Legacy wall dimmer
pub fn iot_dimmer() -> Device {
    let mut dimmer = device("dimmer-1", "Hallway", "HS220", "aa:bb:cc:dd:ee:02", DeviceType::Dimmer);
    dimmer.family = DeviceFamily::Iot;
    dimmer.features = vec![
        state_feature(false),
        Feature::new("brightness", "Brightness", FeatureType::Number, FeatureCategory::Primary)
            .with_value(30)
            .with_range(0.0, 100.0),
    ];
    dimmer
}

/// Hub with a radiator thermostat attached
pub fn hub_with_thermostat() -> Device {
    let mut hub = device("hub-1", "Hub", "H100", "aa:bb:cc:dd:ee:03", DeviceType::Hub);
    hub.features = vec![
        Feature::new("alarm", "Alarm", FeatureType::Switch, FeatureCategory::Config).with_value(false),
    ];

    let mut trv = device("trv-1", "Radiator", "KE100", "aa:bb:cc:dd:ee:04", DeviceType::Thermostat);
    trv.features = vec![
        Feature::new("temperature", "Temperature", FeatureType::Sensor, FeatureCategory::Primary)
            .with_value(21.5)
            .with_unit("°C"),
        Feature::new(
            "target_temperature",
            "Target temperature",
            FeatureType::Number,
            FeatureCategory::Primary,
        )
        .with_value(22)
        .with_range(5.0, 30.0),
        state_feature(true),
        Feature::new("mode", "Mode", FeatureType::Sensor, FeatureCategory::Primary)
            .with_value("heating"),
        Feature::new("battery_level", "Battery level", FeatureType::Sensor, FeatureCategory::Info)
            .with_value(90)
            .with_unit("%"),
        Feature::new(
            "frost_protection_enabled",
            "Frost protection",
            FeatureType::Switch,
            FeatureCategory::Config,
        )
        .with_value(false),
    ];
    hub.children = vec![trv];
    hub
}

/// Wall switch with a fan and a dimmer child
pub fn wall_switch_with_fan() -> Device {
    let mut wall = device("ks240", "Hall", "KS240", "aa:bb:cc:dd:ee:05", DeviceType::WallSwitch);
    wall.features = vec![rssi_feature()];

    let mut fan = device("ks240-fan", "Ceiling Fan", "KS240", "aa:bb:cc:dd:ee:05", DeviceType::Fan);
    fan.features = vec![
        state_feature(false),
        Feature::new("led", "LED", FeatureType::Switch, FeatureCategory::Config).with_value(true),
    ];

    let mut dimmer = device(
        "ks240-dim",
        "Dimmer Switch",
        "KS240",
        "aa:bb:cc:dd:ee:05",
        DeviceType::Dimmer,
    );
    dimmer.features = vec![
        state_feature(true),
        Feature::new("brightness", "Brightness", FeatureType::Number, FeatureCategory::Primary)
            .with_value(55)
            .with_range(0.0, 100.0),
        Feature::new(
            "smooth_transition_on",
            "Smooth transition on",
            FeatureType::Number,
            FeatureCategory::Config,
        )
        .with_value(1)
        .with_range(0.0, 60.0),
    ];

    wall.children = vec![fan, dimmer];
    wall
}
