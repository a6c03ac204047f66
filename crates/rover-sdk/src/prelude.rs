//! 常用类型一次性导入
//!
//! ```rust
//! use rover_sdk::prelude::*;
//! ```

pub use rover_client::{
    AudioSink, ClientError, CollisionReactor, DriveDirection, ExploreConfig, ExploreReport,
    LookDirection, Rover, RoverBuilder, RoverConfig, VoiceCommand, VoiceReply, Waypoint,
};
pub use rover_driver::{
    CollisionEvent, CollisionKind, ConnectionState, Frame, MetricsSnapshot, SensorChannel,
    SensorSnapshot,
};
pub use rover_protocol::{LedMode, Response};
