//! Core process node abstraction for a dataflow pipeline runtime.
//!
//! A [`Process`] declares typed input/output ports and configuration keys,
//! is connected to externally-owned [`Edge`]s, and is driven through a
//! `declare → connect → init → step*` lifecycle by a pipeline scheduler
//! that lives outside this crate.

mod macros;

mod stamp;
pub use self::stamp::{Color, Stamp};

mod datum;
pub use self::datum::{DataInfo, Datum, DatumKind, EdgeDatum};

mod edge;
pub use self::edge::Edge;
pub use self::edge::testing;

mod port;
pub use self::port::{PortDescriptor, PortFlags, PortTable, TYPE_ANY, TYPE_NONE};

mod config;
pub use self::config::{
    ConfigKeyDescriptor, ConfigTable, ConfigValue, FromConfigValue, MapConfig, ProcessConfig,
};

mod error;
pub use self::error::{Error, ErrorKind};

mod process;
pub use self::process::{
    CONFIG_NAME, CONFIG_TYPE, DEFAULT_NAME, HEARTBEAT_PORT, Lifecycle, Process, ProcessBase,
    edge_data_info,
};

#[cfg(test)]
mod scenarios;
