pub mod captain_locator;
pub mod dispatch;
pub mod fare;
pub mod geocoder;
pub mod notifier;
pub mod ride_lifecycle;
pub mod router;

pub use dispatch::Dispatcher;
pub use fare::{FareCalculator, FareTable};
pub use geocoder::{Geocoder, MapTilerGeocoder};
pub use notifier::{ChannelNotifier, LogNotifier, Notifier, RideEvent};
pub use ride_lifecycle::RideLifecycle;
pub use router::{MapboxProvider, OsrmProvider, RouteProvider};
