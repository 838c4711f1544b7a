pub mod frame;
pub mod payload;
pub mod price;
pub mod settings;
pub mod ticker_set;
pub mod timeline;
pub mod window;
