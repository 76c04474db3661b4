//! Kafka end-to-end tests
//!
//! These publish through a real broker and read the records back. They expect a
//! broker reachable at `kafka:9092` and are ignored by default; run them with
//! `--ignored` inside the development environment.

mod publish_e2e;
