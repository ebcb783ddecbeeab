pub mod mocks;
pub mod test_app;
