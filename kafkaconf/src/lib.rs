// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Kafkaconf Authors

//! Resolve Kafka client configuration from files, overrides and environment
//! variables
//!
//! See [`config::resolve`] for the resolution pipeline.

extern crate self as kafkaconf;

pub mod config;
pub mod crypto;
pub mod scram;
pub mod version;
