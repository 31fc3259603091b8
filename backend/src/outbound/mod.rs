//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern: adapters are thin
//! translators between domain types and infrastructure representations and
//! contain no business logic.
//!
//! - **persistence**: in-memory document store backing the repositories
//! - **ttl_store**: in-memory keyed TTL stores for codes and sessions
//! - **mail** / **sms**: reqwest adapters for the hosted messaging providers
//! - **payment**: reqwest adapter for the hosted payment gateway
//! - **images**: reqwest adapter for the image-hosting service

pub mod images;
pub mod mail;
pub mod payment;
pub mod persistence;
pub mod sms;
pub mod ttl_store;
