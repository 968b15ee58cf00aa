//! Background schedulers.

mod pix_expiration;

pub use pix_expiration::PixExpirationSweeper;
