//! Banlingkit Express carrier module
//!
//! HTTP client, wire models and payload mapper for the carrier's JSON API.

mod client;
mod mapper;
mod models;

pub use client::{synthesize_tracking, BanlingkitClient, CarrierEndpoints};
pub use mapper::BanlingkitMapper;
pub use models::WireShipmentRequest;
