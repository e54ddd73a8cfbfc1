// Infrastructure components shared across the HTTP surface.

pub mod digest_store;
