//! # Repository Layer
//!
//! One repository per aggregate. Each wraps the shared pool and exposes
//! typed operations; multi-step mutations run inside transactions owned
//! by the repository, never stitched together by callers.

pub mod bulk_order;
pub mod cart;
pub mod category;
pub mod invoice;
pub mod order;
pub mod product;
pub mod user;
