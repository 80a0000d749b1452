//! Network location of a shard.
//!
//! A location names the machine a shard's data can be fetched from. The
//! registry never inspects it beyond `url()`; placement helpers are here
//! for schedulers that prefer nearby data.

use std::fmt;

/// Distance between two locations on the same server.
pub const DISTANCE_SAME_SERVER: u32 = 0;
/// Distance between two servers in the same rack.
pub const DISTANCE_SAME_RACK: u32 = 1;
/// Distance between two racks in the same data center.
pub const DISTANCE_SAME_DATA_CENTER: u32 = 10;
/// Distance between two data centers.
pub const DISTANCE_REMOTE: u32 = 100;

/// Where a shard physically resides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// Data center name, empty if unknown.
    pub data_center: String,
    /// Rack name, empty if unknown.
    pub rack: String,
    /// Host name or IP address of the server.
    pub server: String,
    /// Port the shard is served on.
    pub port: u16,
}

impl Location {
    /// Creates a location with an unknown data center and rack.
    #[must_use]
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            data_center: String::new(),
            rack: String::new(),
            server: server.into(),
            port,
        }
    }

    /// Sets the data center.
    #[must_use]
    pub fn with_data_center(mut self, data_center: impl Into<String>) -> Self {
        self.data_center = data_center.into();
        self
    }

    /// Sets the rack.
    #[must_use]
    pub fn with_rack(mut self, rack: impl Into<String>) -> Self {
        self.rack = rack.into();
        self
    }

    /// Returns the `server:port` address used to connect to the shard.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    /// Returns true if both locations are in the same data center.
    #[must_use]
    pub fn same_data_center(&self, other: &Self) -> bool {
        self.data_center == other.data_center
    }

    /// Returns true if both locations are in the same rack of the same data center.
    #[must_use]
    pub fn same_rack(&self, other: &Self) -> bool {
        self.same_data_center(other) && self.rack == other.rack
    }

    /// Returns a coarse network distance to another location.
    ///
    /// Lower is closer. Only the ordering of the values is meaningful.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> u32 {
        if !self.same_data_center(other) {
            DISTANCE_REMOTE
        } else if self.rack != other.rack {
            DISTANCE_SAME_DATA_CENTER
        } else if self.server != other.server {
            DISTANCE_SAME_RACK
        } else {
            DISTANCE_SAME_SERVER
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.server, self.port)
    }
}
