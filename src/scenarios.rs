//! Cross-cutting end-to-end scenarios exercising the public [`Process`]
//! surface, as opposed to the per-module unit tests colocated with each
//! type. One test per numbered scenario.

use std::sync::Arc;

use crate::edge::testing::InMemoryEdge;
use crate::{
    ConfigKeyDescriptor, ConfigValue, Datum, DatumKind, EdgeDatum, Error, ErrorKind, HEARTBEAT_PORT,
    MapConfig, PortDescriptor, PortFlags, Process, ProcessBase, ProcessConfig, Stamp, TYPE_ANY,
    edge_data_info,
};

/// A process with no extra ports and no data processing: exactly the
/// "minimal process" the heartbeat/lifecycle scenarios are phrased against.
struct NullProcess {
    base: ProcessBase,
}

impl NullProcess {
    fn new(config: Arc<dyn ProcessConfig>) -> Self {
        Self {
            base: ProcessBase::new(config),
        }
    }
}

impl Process for NullProcess {
    fn base(&self) -> &ProcessBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        &mut self.base
    }
}

/// A process with one required input port `in` and one output port `out`,
/// forwarding each datum it reads.
struct PassThrough {
    base: ProcessBase,
}

impl PassThrough {
    fn new(config: Arc<dyn ProcessConfig>) -> Self {
        let mut base = ProcessBase::new(config);
        base.declare_input_port(
            "in",
            PortDescriptor::new(TYPE_ANY, PortFlags::REQUIRED, "required input"),
        )
        .unwrap();
        base.declare_output_port("out", PortDescriptor::new(TYPE_ANY, PortFlags::NONE, "output"))
            .unwrap();
        Self { base }
    }
}

impl Process for PassThrough {
    fn base(&self) -> &ProcessBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessBase {
        &mut self.base
    }

    fn _step(&mut self) -> Result<(), Error> {
        let edge_datum = self.grab_from_port("in")?;
        self.push_to_port("out", edge_datum)
    }
}

/// Scenario 1: three steps on a minimal process yield three `empty`
/// heartbeats with sequences 0, 1, 2, all sharing one color.
#[test]
fn happy_heartbeat() {
    let mut process = NullProcess::new(Arc::new(MapConfig::new()));
    let heartbeat = InMemoryEdge::new();
    process
        .connect_output_port(HEARTBEAT_PORT, heartbeat.clone())
        .unwrap();
    process.init().unwrap();

    for _ in 0..3 {
        process.step().unwrap();
    }

    let received = heartbeat.drain();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].stamp.sequence(), 0);
    assert_eq!(received[1].stamp.sequence(), 1);
    assert_eq!(received[2].stamp.sequence(), 2);
    assert!(received.iter().all(|d| d.datum.kind() == DatumKind::Empty));
    assert!(received[0].stamp.same_color(&received[1].stamp));
    assert!(received[1].stamp.same_color(&received[2].stamp));
}

/// Scenario 2: completion propagates `mark_downstream_complete` to every
/// connected input edge, and the next heartbeat carries `complete` without
/// `_step` running.
#[test]
fn completion_propagation() {
    let mut process = PassThrough::new(Arc::new(MapConfig::new()));
    let heartbeat = InMemoryEdge::new();
    let input = InMemoryEdge::new();
    process
        .connect_output_port(HEARTBEAT_PORT, heartbeat.clone())
        .unwrap();
    process.connect_input_port("in", input.clone()).unwrap();
    process.init().unwrap();

    input.push(EdgeDatum::new(Datum::data(1i32), Stamp::new()));
    process.mark_as_complete();
    assert_eq!(input.mark_calls(), 1);

    process.step().unwrap();
    let received = heartbeat.drain();
    assert_eq!(received.last().unwrap().datum.kind(), DatumKind::Complete);
    assert_eq!(
        input.drain().len(),
        1,
        "_step must not run once the process is complete"
    );
}

/// Scenario 3: reconnecting a port with a still-live edge is rejected;
/// once the prior edge expires, the same connect succeeds.
#[test]
fn reconnect_rejection() {
    let mut process = PassThrough::new(Arc::new(MapConfig::new()));
    let a = InMemoryEdge::new();
    process.connect_input_port("in", a.clone()).unwrap();

    let b = InMemoryEdge::new();
    let err = process.connect_input_port("in", b.clone()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::PortReconnect { .. }));

    drop(a);
    process.connect_input_port("in", b).unwrap();
}

/// Scenario 4: `step()` before `init()` raises `uninitialized`.
#[test]
fn uninitialized_step() {
    let mut process = NullProcess::new(Arc::new(MapConfig::new()));
    let err = process.step().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Uninitialized { .. }));
}

/// Scenario 5: configuration reads fall back to the declared default, pick
/// up an explicit value when present, and fail for an undeclared key.
#[test]
fn config_fallback() {
    let mut default_only = NullProcess::new(Arc::new(MapConfig::new()));
    default_only
        .declare_configuration_key("k", ConfigKeyDescriptor::new(ConfigValue::from("d"), ""))
        .unwrap();
    assert_eq!(default_only.config_value::<String>("k").unwrap(), "d");

    let mut with_value = NullProcess::new(Arc::new(MapConfig::new().with_value("k", "x")));
    with_value
        .declare_configuration_key("k", ConfigKeyDescriptor::new(ConfigValue::from("d"), ""))
        .unwrap();
    assert_eq!(with_value.config_value::<String>("k").unwrap(), "x");

    let err = default_only.config_value::<String>("missing").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownConfigurationValue { .. }));
}

/// Scenario 6: `edge_data_info` reports mismatched colors, mismatched
/// sync, and the highest-priority datum kind present.
#[test]
fn data_info_summary() {
    let c1 = Stamp::new();
    let c2 = Stamp::new();
    let batch = [
        EdgeDatum::new(Datum::data(1i32), c1),
        EdgeDatum::new(Datum::empty(), c1),
        EdgeDatum::new(Datum::error("boom"), c2),
    ];

    let info = edge_data_info(&batch);
    assert!(!info.same_color);
    assert!(!info.in_sync);
    assert_eq!(info.max_status, DatumKind::Error);
}

/// Scenario 7 (ambient addition): `init()` rejects a process with an
/// unconnected `_required` input port, and succeeds once connected.
#[test]
fn required_input_gate() {
    let mut process = PassThrough::new(Arc::new(MapConfig::new()));
    let err = process.init().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingRequiredInput { .. }));

    process.connect_input_port("in", InMemoryEdge::new()).unwrap();
    process.init().unwrap();
}

/// Scenario 8 (ambient addition): a single `push_to_port` reaches every
/// edge fanned out from that output port.
#[test]
fn output_fan_out() {
    let mut process = NullProcess::new(Arc::new(MapConfig::new()));
    process
        .declare_output_port("out", PortDescriptor::new(TYPE_ANY, PortFlags::NONE, "out"))
        .unwrap();

    let a = InMemoryEdge::new();
    let b = InMemoryEdge::new();
    process.connect_output_port("out", a.clone()).unwrap();
    process.connect_output_port("out", b.clone()).unwrap();

    process
        .push_to_port("out", EdgeDatum::new(Datum::data(1i32), Stamp::new()))
        .unwrap();

    assert_eq!(a.drain().len(), 1);
    assert_eq!(b.drain().len(), 1);
}
