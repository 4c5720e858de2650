pub mod mock_settings_store;
pub mod mock_transport;
