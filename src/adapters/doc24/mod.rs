//! Doc24 telemedicine provider adapter.

mod client;
mod dto;

pub use client::{Doc24Client, Doc24Config};
