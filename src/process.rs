use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::config::{ConfigKeyDescriptor, ConfigTable, ConfigValue, FromConfigValue, ProcessConfig};
use crate::datum::{DataInfo, Datum, DatumKind, EdgeDatum};
use crate::edge::{Edge, is_live, push_to_edges};
use crate::error::Error;
use crate::port::{PortDescriptor, PortFlags, PortTable, TYPE_NONE};
use crate::stamp::Stamp;

/// The reserved output port every process carries: one stamped status datum
/// per `step()`, used downstream to observe liveness and completion.
pub const HEARTBEAT_PORT: &str = "heartbeat";

/// The reserved configuration key holding a process's display name.
pub const CONFIG_NAME: &str = "_name";
/// The reserved configuration key holding a process's type tag.
pub const CONFIG_TYPE: &str = "_type";

/// The sentinel name a process carries when `_name` is absent from its
/// configuration.
pub const DEFAULT_NAME: &str = "(unnamed)";

/// The state a [`ProcessBase`] has reached in its forward-only lifecycle,
/// as returned by [`ProcessBase::lifecycle`]/[`Process::lifecycle`].
///
/// The five states from the design (`Declared → Connected → Initialized →
/// Running → Complete`) collapse onto these three: "Connected" and
/// "Declared" are distinguished only by whether any edges have been
/// attached yet, and "Running" is just "Initialized" with at least one
/// `step()` behind it — none of those distinctions change how a guard
/// behaves, so they fold into the state either side of them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lifecycle {
    Declared,
    Initialized,
    Complete,
}

/// The state owned exclusively by a process: its port/config catalogs,
/// edge connections, heartbeat stamp, and policy flags.
///
/// A concrete process embeds one `ProcessBase` and implements [`Process`]
/// over it, the way the rest of this crate's lineage favors a base struct
/// plus a thin trait over classical inheritance.
pub struct ProcessBase {
    name: String,
    type_tag: String,
    config: Arc<dyn ProcessConfig>,
    input_ports: PortTable,
    output_ports: PortTable,
    config_keys: ConfigTable,
    input_edges: BTreeMap<String, Weak<dyn Edge>>,
    output_edges: BTreeMap<String, Vec<Weak<dyn Edge>>>,
    initialized: bool,
    is_complete: bool,
    input_same_color: bool,
    input_sync: bool,
    input_valid: bool,
    heartbeat_stamp: Stamp,
}

impl ProcessBase {
    /// Construct a new base, declaring the reserved `heartbeat` output port
    /// and the reserved `_name`/`_type` configuration keys, and reading
    /// identity fields out of `config`.
    pub fn new(config: Arc<dyn ProcessConfig>) -> Self {
        let name = config
            .get_value(CONFIG_NAME)
            .and_then(|value| String::from_config_value(&value))
            .unwrap_or_else(|| DEFAULT_NAME.to_owned());
        let type_tag = config
            .get_value(CONFIG_TYPE)
            .and_then(|value| String::from_config_value(&value))
            .unwrap_or_default();

        let mut output_ports = PortTable::new();
        output_ports.declare(
            HEARTBEAT_PORT,
            PortDescriptor::new(TYPE_NONE, PortFlags::NONE, "Per-step liveness/completion signal"),
        );

        let mut config_keys = ConfigTable::new();
        config_keys.declare(
            CONFIG_NAME,
            ConfigKeyDescriptor::new(ConfigValue::from(DEFAULT_NAME), "Process display name"),
        );
        config_keys.declare(
            CONFIG_TYPE,
            ConfigKeyDescriptor::new(ConfigValue::from(""), "Process type tag"),
        );

        debug!(name, type_tag, "process declared");

        Self {
            name,
            type_tag,
            config,
            input_ports: PortTable::new(),
            output_ports,
            config_keys,
            input_edges: BTreeMap::new(),
            output_edges: BTreeMap::new(),
            initialized: false,
            is_complete: false,
            input_same_color: true,
            input_sync: true,
            input_valid: true,
            heartbeat_stamp: Stamp::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    #[inline]
    pub fn config(&self) -> &dyn ProcessConfig {
        self.config.as_ref()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// The current point in the forward-only lifecycle.
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        if self.is_complete {
            Lifecycle::Complete
        } else if self.initialized {
            Lifecycle::Initialized
        } else {
            Lifecycle::Declared
        }
    }

    #[inline]
    pub fn heartbeat_stamp(&self) -> Stamp {
        self.heartbeat_stamp
    }

    #[inline]
    pub fn input_port_table(&self) -> &PortTable {
        &self.input_ports
    }

    #[inline]
    pub fn output_port_table(&self) -> &PortTable {
        &self.output_ports
    }

    #[inline]
    pub fn config_table(&self) -> &ConfigTable {
        &self.config_keys
    }

    /// Declare (or overwrite) an input port. Only callable before `init()`.
    pub fn declare_input_port(
        &mut self,
        name: impl Into<String>,
        descriptor: PortDescriptor,
    ) -> Result<(), Error> {
        let name = name.into();

        if self.initialized {
            return Err(Error::declaration_after_init(self.name.clone(), name));
        }

        trace!(process = %self.name, port = %name, "declare input port");
        self.input_ports.declare(name, descriptor);
        Ok(())
    }

    /// Declare (or overwrite) an output port. Only callable before `init()`.
    ///
    /// Subclasses must not redeclare [`HEARTBEAT_PORT`]; the core does not
    /// enforce this, so doing so will silently replace the reserved
    /// descriptor.
    pub fn declare_output_port(
        &mut self,
        name: impl Into<String>,
        descriptor: PortDescriptor,
    ) -> Result<(), Error> {
        let name = name.into();

        if self.initialized {
            return Err(Error::declaration_after_init(self.name.clone(), name));
        }

        trace!(process = %self.name, port = %name, "declare output port");
        self.output_ports.declare(name, descriptor);
        Ok(())
    }

    /// Declare (or overwrite) a configuration key. Only callable before
    /// `init()`.
    pub fn declare_configuration_key(
        &mut self,
        name: impl Into<String>,
        descriptor: ConfigKeyDescriptor,
    ) -> Result<(), Error> {
        let name = name.into();

        if self.initialized {
            return Err(Error::declaration_after_init(self.name.clone(), name));
        }

        trace!(process = %self.name, key = %name, "declare configuration key");
        self.config_keys.declare(name, descriptor);
        Ok(())
    }

    /// Record `edge` as the live connection for an already-declared input
    /// `port`, rejecting a reconnect while the prior edge is still live.
    pub fn record_input_edge(&mut self, port: &str, edge: Arc<dyn Edge>) -> Result<(), Error> {
        if let Some(existing) = self.input_edges.get(port) {
            if is_live(existing) {
                return Err(Error::port_reconnect(self.name.clone(), port.to_owned()));
            }
        }

        debug!(process = %self.name, port, "input port connected");
        self.input_edges.insert(port.to_owned(), Arc::downgrade(&edge));
        Ok(())
    }

    /// Append `edge` to the fan-out list for an already-declared output
    /// `port`.
    pub fn record_output_edge(&mut self, port: &str, edge: Arc<dyn Edge>) {
        debug!(process = %self.name, port, "output port connected");
        self.output_edges
            .entry(port.to_owned())
            .or_default()
            .push(Arc::downgrade(&edge));
    }

    /// Every `_required` input port that does not currently have a live
    /// connected edge.
    pub fn missing_required_inputs(&self) -> Vec<&str> {
        self.input_ports
            .required()
            .iter()
            .filter(|port| !matches!(self.input_edges.get(port.as_str()), Some(edge) if is_live(edge)))
            .map(String::as_str)
            .collect()
    }

    fn run_heartbeat(&mut self) {
        let datum = if self.is_complete {
            Datum::complete()
        } else {
            Datum::empty()
        };
        let edge_datum = EdgeDatum::new(datum, self.heartbeat_stamp);

        if let Some(edges) = self.output_edges.get(HEARTBEAT_PORT) {
            push_to_edges(edges, &edge_datum);
        }

        trace!(process = %self.name, sequence = self.heartbeat_stamp.sequence(), "heartbeat emitted");
        self.heartbeat_stamp = self.heartbeat_stamp.increment();
    }

    fn mark_as_complete(&mut self) {
        if self.is_complete {
            return;
        }

        self.is_complete = true;
        debug!(process = %self.name, "marked complete");

        for edge in self.input_edges.values() {
            if let Some(edge) = edge.upgrade() {
                edge.mark_downstream_complete();
            }
        }
    }
}

/// Summarize a batch of `(datum, stamp)` pairs as returned by a `step`
/// reading several input ports at once.
///
/// `same_color` is true iff every stamp shares the first stamp's color;
/// `in_sync` is true iff every stamp equals the first stamp exactly;
/// `max_status` is the highest-priority [`DatumKind`] present, using the
/// `data < empty < complete < error < invalid` ordering.
pub fn edge_data_info(batch: &[EdgeDatum]) -> DataInfo {
    let Some(first) = batch.first() else {
        return DataInfo {
            same_color: true,
            in_sync: true,
            max_status: DatumKind::Data,
        };
    };

    let same_color = batch.iter().all(|d| d.stamp.same_color(&first.stamp));
    let in_sync = batch.iter().all(|d| d.stamp == first.stamp);
    let max_status = batch
        .iter()
        .map(|d| d.datum.kind())
        .max()
        .unwrap_or(DatumKind::Data);

    DataInfo {
        same_color,
        in_sync,
        max_status,
    }
}

fn merge_catalog<T>(
    base: impl Iterator<Item = (String, T)>,
    overrides: Vec<(String, T)>,
) -> Vec<(String, T)> {
    let mut merged: BTreeMap<String, T> = base.collect();

    for (name, descriptor) in overrides {
        merged.insert(name, descriptor);
    }

    merged.into_iter().collect()
}

/// The process node abstraction: lifecycle state machine, connection
/// registry, and step/heartbeat driver.
///
/// A concrete process is a struct embedding a [`ProcessBase`] that
/// implements this trait. The only method every concrete process must
/// supply is [`Process::base`]/[`Process::base_mut`]; every override hook
/// (the `_`-prefixed methods) has a default body, so a minimal process
/// needs to override only `_step` and whatever ports/keys it declares in
/// its own constructor.
///
/// This dual path — a declaration table plus override hooks whose results
/// are concatenated with it — guarantees: (a) base-declared ports are
/// always reported, (b) subclasses can add more, (c) a subclass override
/// is authoritative when both provide info for the same name.
pub trait Process: Send + Sync {
    /// Borrow the embedded base state.
    fn base(&self) -> &ProcessBase;

    /// Mutably borrow the embedded base state.
    fn base_mut(&mut self) -> &mut ProcessBase;

    /// Subclass initialization hook, run once by [`Process::init`].
    fn _init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Subclass per-step data-processing hook, skipped once the process is
    /// complete.
    fn _step(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Accept connection of an edge to an input port not present in the
    /// base table. Implementations that support dynamic input ports must
    /// declare the port (via [`ProcessBase::declare_input_port`]) and then
    /// record the edge (via [`ProcessBase::record_input_edge`]); the
    /// default rejects with [`Error::no_such_port`].
    #[allow(unused_variables)]
    fn _connect_input_port(&mut self, port: &str, edge: Arc<dyn Edge>) -> Result<(), Error> {
        Err(Error::no_such_port(self.base().name().to_owned(), port.to_owned()))
    }

    /// Same contract as [`Process::_connect_input_port`], for output ports.
    #[allow(unused_variables)]
    fn _connect_output_port(&mut self, port: &str, edge: Arc<dyn Edge>) -> Result<(), Error> {
        Err(Error::no_such_port(self.base().name().to_owned(), port.to_owned()))
    }

    /// Additional input ports a subclass reports beyond the base table.
    fn _input_ports(&self) -> Vec<(String, PortDescriptor)> {
        Vec::new()
    }

    /// Additional output ports a subclass reports beyond the base table.
    fn _output_ports(&self) -> Vec<(String, PortDescriptor)> {
        Vec::new()
    }

    /// Subclass-authoritative lookup of a single input port's descriptor.
    #[allow(unused_variables)]
    fn _input_port_info(&self, port: &str) -> Option<PortDescriptor> {
        None
    }

    /// Subclass-authoritative lookup of a single output port's descriptor.
    #[allow(unused_variables)]
    fn _output_port_info(&self, port: &str) -> Option<PortDescriptor> {
        None
    }

    /// Additional configuration keys a subclass reports beyond the base
    /// table.
    fn _available_config(&self) -> Vec<(String, ConfigKeyDescriptor)> {
        Vec::new()
    }

    /// Subclass-authoritative lookup of a single configuration key.
    #[allow(unused_variables)]
    fn _config_info(&self, key: &str) -> Option<ConfigKeyDescriptor> {
        None
    }

    /// True if the scheduler may invoke `step()` concurrently on this
    /// instance. Defaults to `false`; the base makes no internal locking
    /// guarantees either way, so a subclass advertising `true` is
    /// responsible for its own `_step` collation safety.
    fn is_reentrant(&self) -> bool {
        false
    }

    #[inline]
    fn name(&self) -> &str {
        self.base().name()
    }

    #[inline]
    fn type_tag(&self) -> &str {
        self.base().type_tag()
    }

    /// The current point in the forward-only lifecycle.
    #[inline]
    fn lifecycle(&self) -> Lifecycle {
        self.base().lifecycle()
    }

    /// Declare (or overwrite) an input port. Only callable before `init()`.
    fn declare_input_port(
        &mut self,
        name: impl Into<String>,
        descriptor: PortDescriptor,
    ) -> Result<(), Error> {
        self.base_mut().declare_input_port(name, descriptor)
    }

    /// Declare (or overwrite) an output port. Only callable before `init()`.
    fn declare_output_port(
        &mut self,
        name: impl Into<String>,
        descriptor: PortDescriptor,
    ) -> Result<(), Error> {
        self.base_mut().declare_output_port(name, descriptor)
    }

    /// Declare (or overwrite) a configuration key. Only callable before
    /// `init()`.
    fn declare_configuration_key(
        &mut self,
        name: impl Into<String>,
        descriptor: ConfigKeyDescriptor,
    ) -> Result<(), Error> {
        self.base_mut().declare_configuration_key(name, descriptor)
    }

    /// The full set of input ports: base-declared plus subclass-reported,
    /// subclass authoritative on name conflicts.
    fn input_ports(&self) -> Vec<(String, PortDescriptor)> {
        merge_catalog(self.base().input_ports.entries(), self._input_ports())
    }

    /// The full set of output ports: base-declared plus subclass-reported,
    /// subclass authoritative on name conflicts.
    fn output_ports(&self) -> Vec<(String, PortDescriptor)> {
        merge_catalog(self.base().output_ports.entries(), self._output_ports())
    }

    /// Look up one input port's descriptor, preferring the subclass
    /// override when present.
    fn input_port_info(&self, port: &str) -> Option<PortDescriptor> {
        self._input_port_info(port)
            .or_else(|| self.base().input_ports.get(port).cloned())
    }

    /// Look up one output port's descriptor, preferring the subclass
    /// override when present.
    fn output_port_info(&self, port: &str) -> Option<PortDescriptor> {
        self._output_port_info(port)
            .or_else(|| self.base().output_ports.get(port).cloned())
    }

    /// The full set of configuration keys: base-declared plus
    /// subclass-reported, subclass authoritative on name conflicts.
    fn available_config(&self) -> Vec<(String, ConfigKeyDescriptor)> {
        merge_catalog(self.base().config_keys.entries(), self._available_config())
    }

    /// Look up one configuration key's descriptor, preferring the subclass
    /// override when present.
    fn config_info(&self, key: &str) -> Option<ConfigKeyDescriptor> {
        self._config_info(key)
            .or_else(|| self.base().config_keys.get(key).cloned())
    }

    /// Read a configuration value, falling back to the declared default,
    /// converted to `T`.
    ///
    /// Fails with [`Error::unknown_configuration_value`] if `key` was never
    /// declared, or [`Error::invalid_configuration_value`] if the stored or
    /// default value cannot be converted to `T`.
    fn config_value<T: FromConfigValue>(&self, key: &str) -> Result<T, Error> {
        let Some(descriptor) = self.config_info(key) else {
            return Err(Error::unknown_configuration_value(
                self.name().to_owned(),
                key.to_owned(),
            ));
        };

        let raw = self
            .base()
            .config
            .get_value(key)
            .unwrap_or(descriptor.default);

        T::from_config_value(&raw).ok_or_else(|| {
            Error::invalid_configuration_value(self.name().to_owned(), key.to_owned(), T::TYPE_NAME)
        })
    }

    /// Connect `edge` to `port`. Rejects if this process is already
    /// initialized, or if `port` has a prior edge that is still live.
    fn connect_input_port(&mut self, port: &str, edge: Arc<dyn Edge>) -> Result<(), Error> {
        if self.base().is_initialized() {
            return Err(Error::connect_to_initialized_process(
                self.name().to_owned(),
                port.to_owned(),
            ));
        }

        if self.base().input_ports.get(port).is_some() {
            self.base_mut().record_input_edge(port, edge)
        } else {
            self._connect_input_port(port, edge)
        }
    }

    /// Connect `edge` to `port`, appending it to the fan-out list.
    ///
    /// Unlike input connection, this is permitted at any lifecycle stage —
    /// the documented relaxation for this crate (see `DESIGN.md`), useful
    /// for a scheduler attaching a monitoring tap to a running pipeline.
    fn connect_output_port(&mut self, port: &str, edge: Arc<dyn Edge>) -> Result<(), Error> {
        if self.base().output_ports.get(port).is_some() {
            self.base_mut().record_output_edge(port, edge);
            Ok(())
        } else {
            self._connect_output_port(port, edge)
        }
    }

    /// The currently connected edge for an input port, if any and if live.
    fn input_port_edge(&self, port: &str) -> Option<Arc<dyn Edge>> {
        self.base().input_edges.get(port).and_then(Weak::upgrade)
    }

    /// The currently connected, still-live edges for an output port.
    fn output_port_edges(&self, port: &str) -> Vec<Arc<dyn Edge>> {
        self.base()
            .output_edges
            .get(port)
            .map(|edges| edges.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Initialize this process. Rejects reinitialization, and rejects
    /// `init()` while a `_required` input port has no live connected edge.
    #[tracing::instrument(level = "debug", skip(self), fields(process = self.name()))]
    fn init(&mut self) -> Result<(), Error> {
        if self.base().is_initialized() {
            return Err(Error::reinitialization(self.name().to_owned()));
        }

        if let Some(port) = self.base().missing_required_inputs().first() {
            return Err(Error::missing_required_input(
                self.name().to_owned(),
                (*port).to_owned(),
            ));
        }

        self._init()?;
        self.base_mut().initialized = true;
        Ok(())
    }

    /// Advance this process by one step: run `_step` unless already
    /// complete, then always emit a heartbeat.
    #[tracing::instrument(level = "trace", skip(self), fields(process = self.name()))]
    fn step(&mut self) -> Result<(), Error> {
        if !self.base().is_initialized() {
            return Err(Error::uninitialized(self.name().to_owned()));
        }

        if !self.base().is_complete() {
            self._step()?;
        }

        self.base_mut().run_heartbeat();
        Ok(())
    }

    /// Mark this process as complete: idempotent after the first call.
    /// Notifies every currently-connected input edge via
    /// [`Edge::mark_downstream_complete`].
    fn mark_as_complete(&mut self) {
        self.base_mut().mark_as_complete();
    }

    /// Read one `(datum, stamp)` pair from `port`, blocking/suspending on
    /// the underlying edge.
    fn grab_from_port(&self, port: &str) -> Result<EdgeDatum, Error> {
        if self.input_port_info(port).is_none() {
            return Err(Error::no_such_port(self.name().to_owned(), port.to_owned()));
        }

        let edge = self
            .base()
            .input_edges
            .get(port)
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::missing_connection(self.name().to_owned(), port.to_owned()))?;

        Ok(edge.get())
    }

    /// Push one `(datum, stamp)` pair to every edge fanned out from `port`.
    /// A no-op if `port` is declared but has no connected edges, which
    /// permits optional outputs.
    fn push_to_port(&self, port: &str, edge_datum: EdgeDatum) -> Result<(), Error> {
        if self.output_port_info(port).is_none() {
            return Err(Error::no_such_port(self.name().to_owned(), port.to_owned()));
        }

        if let Some(edges) = self.base().output_edges.get(port) {
            push_to_edges(edges, &edge_datum);
        }

        Ok(())
    }

    /// Broadcast helper over an explicit group of edges, bypassing port
    /// lookup (e.g. for a caller that already holds the fan-out list from
    /// [`Process::output_port_edges`]).
    fn push_to_edges(&self, edges: &[Weak<dyn Edge>], edge_datum: &EdgeDatum) {
        push_to_edges(edges, edge_datum);
    }

    /// Summarize a batch of `(datum, stamp)` pairs; see [`edge_data_info`].
    fn edge_data_info(&self, batch: &[EdgeDatum]) -> DataInfo {
        edge_data_info(batch)
    }

    /// Set the advisory "inputs share a color" policy flag, read back via
    /// [`Process::input_same_color`]. Not enforced by the base class.
    fn ensure_inputs_are_same_color(&mut self, value: bool) {
        self.base_mut().input_same_color = value;
    }

    /// Set the advisory "inputs are in sync" policy flag.
    fn ensure_inputs_are_in_sync(&mut self, value: bool) {
        self.base_mut().input_sync = value;
    }

    /// Set the advisory "inputs are valid" policy flag.
    fn ensure_inputs_are_valid(&mut self, value: bool) {
        self.base_mut().input_valid = value;
    }

    fn input_same_color(&self) -> bool {
        self.base().input_same_color
    }

    fn input_sync(&self) -> bool {
        self.base().input_sync
    }

    fn input_valid(&self) -> bool {
        self.base().input_valid
    }
}
