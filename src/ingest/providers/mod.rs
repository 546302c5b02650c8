// src/ingest/providers/mod.rs
pub mod apod;
pub mod frb;
pub mod gravitational;
pub mod pulsar;
