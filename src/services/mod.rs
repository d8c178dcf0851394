//! Platform Services
//!
//! Best-effort helpers that talk to the device or third-party services.

mod currency;

pub use currency::{
    Coordinates, CurrencyResolver, GeoLocator, HttpIpLocator, HttpReverseGeocoder, IpLocator, LocateError,
    ReverseGeocoder,
};
