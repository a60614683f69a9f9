//! Response negotiation.
//!
//! A [`ResponseFactory`] picks the builder registered for a resource's
//! content type, runs the cache validator (304 short-circuit), applies the
//! empty-payload policy (204) and hands the data to the builder together
//! with the mapper for that content type.

pub mod builder;
pub mod cache;
pub mod factory;
pub mod mapper;
pub mod registry;
pub mod request;

pub use builder::{ApiResponse, ResponseBody, ResponseBuilder, ResponseKind};
pub use cache::{CacheValidator, EntityTagValidator};
pub use factory::ResponseFactory;
pub use mapper::{Mapper, MapperContext};
pub use registry::ResponseRegistry;
pub use request::{RequestInfo, ResponseHead};
