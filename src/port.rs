use std::collections::BTreeMap;

use crate::macros::bitflags;

/// Wildcard port type tag: compatible with any other type tag.
pub const TYPE_ANY: &str = "_any";
/// Port type tag for ports that carry no payload (e.g. `heartbeat`).
pub const TYPE_NONE: &str = "_none";

bitflags! {
    /// Flags on a [`PortDescriptor`].
    pub struct PortFlags(u32) {
        pub const NONE = 0;
        /// The output is immutable once pushed.
        pub const CONST = 1 << 0;
        /// The input may be modified in place by the receiving process.
        pub const MUTABLE = 1 << 1;
        /// The port must have a live connected edge before `init()`.
        pub const REQUIRED = 1 << 2;
    }
}

impl Default for PortFlags {
    #[inline]
    fn default() -> Self {
        Self::NONE
    }
}

/// Declarative metadata for one input or output port.
#[derive(Clone, Debug)]
pub struct PortDescriptor {
    pub port_type: String,
    pub flags: PortFlags,
    pub description: String,
}

impl PortDescriptor {
    pub fn new(
        port_type: impl Into<String>,
        flags: PortFlags,
        description: impl Into<String>,
    ) -> Self {
        Self {
            port_type: port_type.into(),
            flags,
            description: description.into(),
        }
    }

    /// True if this port carries the `_required` flag.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.flags.contains(PortFlags::REQUIRED)
    }
}

/// A name-keyed table of port descriptors, plus the derived list of
/// `_required` port names.
///
/// Used identically for the input-port table and the output-port table; a
/// process owns one of each. `BTreeMap` gives deterministic iteration order
/// for `input_ports()`/`output_ports()`.
#[derive(Default, Debug)]
pub struct PortTable {
    ports: BTreeMap<String, PortDescriptor>,
    required: Vec<String>,
}

impl PortTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or overwrite) a port, updating the derived required-list.
    pub fn declare(&mut self, name: impl Into<String>, descriptor: PortDescriptor) {
        let name = name.into();
        self.required.retain(|n| n != &name);

        if descriptor.is_required() {
            self.required.push(name.clone());
        }

        self.ports.insert(name, descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&PortDescriptor> {
        self.ports.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    /// All declared entries, cloned, keyed by name in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (String, PortDescriptor)> + '_ {
        self.ports
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }
}
