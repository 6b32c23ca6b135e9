//! Public routing enums shared between the route manager and the host.

/// Direction of a streaming endpoint on a node.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointType {
    Source = 0x00,
    Sink = 0x01,
}

/// State of an endpoint object.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EndpointState {
    /// Not handled yet, or fully released.
    #[default]
    Idle = 0x00,
    /// A resource-manager job is in flight for this endpoint.
    XrmProcessing = 0x01,
    /// All resources of the endpoint are built.
    Built = 0x02,
}

/// State of a route object. A route is in exactly one state at any time.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RouteState {
    #[default]
    Idle = 0x00,
    Construction = 0x01,
    Built = 0x02,
    Deteriorated = 0x03,
    Destruction = 0x04,
    Suspended = 0x05,
}

/// Severity classification of the last routing error.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RouteResult {
    #[default]
    NoError = 0x00,
    /// Transient failure; the route retries on a later tick.
    Uncritical = 0x01,
    /// Permanent failure; the route suspends.
    Critical = 0x02,
}

/// Information item delivered through the route report callback.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteInfos {
    Built = 0x00,
    Destroyed = 0x01,
    Suspended = 0x02,
    /// The routing process terminated before the route reached a stable
    /// state.
    ProcessStop = 0x03,
}
