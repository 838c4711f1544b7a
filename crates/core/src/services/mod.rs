pub mod income_adjustment;
pub mod price_service;
pub mod series_math;
pub mod series_store;
pub mod window_mapper;
